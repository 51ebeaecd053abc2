//! Contribgate - Commit Authorization Gate CLI
//!
//! The `contribgate` command validates incoming commits against the
//! contribution-tracking rules: project committers pass outright; everyone
//! else needs a signed contributor agreement (or a bot registration) plus a
//! matching sign-off, and only committers may push on behalf of others.
//!
//! ## Commands
//!
//! - `validate`: Validate a commit submission file against the remote
//!   profile service (per-check resolution)
//! - `delegate`: Submit the whole batch to the remote validation endpoint
//! - `token`: Fetch an access token to smoke-test the configured credentials

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::Level;

use contribgate_core::{
    AccountDirectory, CommitSubmission, CommitValidator, CommitterRegistry, Identity, LocalAccount,
    Severity, ValidationOutcome,
};
use contribgate_remote::{
    DelegatedValidator, OAuthTokenEndpoint, ProfileClient, ProviderType, RemoteDirectory,
    RequestCommit, ServiceConfig, TokenManager, ValidationRequest,
};

#[derive(Parser)]
#[command(name = "contribgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Commit authorization gate", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a commit submission against the remote profile service
    Validate {
        /// Path to the submission file (JSON)
        #[arg(short, long)]
        submission: PathBuf,

        /// Documentation URL appended to rejections
        #[arg(long)]
        docs_url: Option<String>,
    },

    /// Submit the batch to the delegated validation endpoint
    Delegate {
        /// Path to the submission file (JSON)
        #[arg(short, long)]
        submission: PathBuf,

        /// Repository URL reported to the validation endpoint
        #[arg(long)]
        repo_url: String,

        /// Submitting provider: gerrit, github, or gitlab
        #[arg(long, default_value = "gerrit")]
        provider: String,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,

        /// Documentation URL appended to rejections
        #[arg(long)]
        docs_url: Option<String>,
    },

    /// Fetch an access token to smoke-test the configured credentials
    Token,
}

/// A commit submission file: the commits of one push plus the host context
/// the gate needs (pusher, committer roster, known accounts).
#[derive(Debug, Deserialize)]
struct SubmissionFile {
    project: String,
    pusher: PusherEntry,
    commits: Vec<CommitSubmission>,
    #[serde(default)]
    committers: Vec<String>,
    #[serde(default)]
    accounts: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize)]
struct PusherEntry {
    name: String,
    mail: String,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    username: String,
    emails: Vec<String>,
}

/// Committer roster from the submission file.
struct StaticCommitters(HashSet<String>);

#[async_trait]
impl CommitterRegistry for StaticCommitters {
    async fn is_committer(&self, identity: &Identity, _project: &str) -> bool {
        identity
            .username()
            .map(|username| self.0.contains(username))
            .unwrap_or(false)
    }
}

/// Account table from the submission file, indexed by username and email.
struct StaticAccounts(HashMap<String, LocalAccount>);

impl StaticAccounts {
    fn from_entries(entries: &[AccountEntry]) -> Self {
        let mut index = HashMap::new();
        for entry in entries {
            let mut account = LocalAccount::new(&entry.username);
            for email in &entry.emails {
                account = account.with_email(email);
            }
            index.insert(entry.username.clone(), account.clone());
            for email in &entry.emails {
                index.insert(email.clone(), account.clone());
            }
        }
        Self(index)
    }
}

#[async_trait]
impl AccountDirectory for StaticAccounts {
    async fn resolve(&self, email_or_username: &str) -> Option<LocalAccount> {
        self.0.get(email_or_username).cloned()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    contribgate_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Validate {
            submission,
            docs_url,
        } => cmd_validate(&submission, docs_url.as_deref()).await,
        Commands::Delegate {
            submission,
            repo_url,
            provider,
            strict,
            docs_url,
        } => cmd_delegate(&submission, &repo_url, &provider, strict, docs_url.as_deref()).await,
        Commands::Token => cmd_token().await,
    }
}

fn load_submission(path: &PathBuf) -> Result<SubmissionFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read submission file {path:?}"))?;
    serde_json::from_str(&raw).context("Failed to parse submission as JSON")
}

fn pusher_identity(entry: &PusherEntry) -> Identity {
    let mut identity = Identity::new(&entry.name, &entry.mail);
    if let Some(username) = &entry.username {
        identity = identity.with_username(username);
    }
    identity
}

fn render(outcome: &ValidationOutcome) {
    for message in outcome.messages() {
        match message.severity {
            Severity::Info => println!("{}", message.text),
            Severity::Error => println!("ERROR: {}", message.text),
        }
    }
    for error in outcome.errors() {
        eprintln!("error: {error}");
    }
}

async fn cmd_validate(submission: &PathBuf, docs_url: Option<&str>) -> Result<()> {
    let file = load_submission(submission)?;
    let config = ServiceConfig::from_env().context("Service configuration is incomplete")?;

    let directory = RemoteDirectory::new(Arc::new(ProfileClient::new(config)));
    let mut validator = CommitValidator::new(
        Arc::new(StaticCommitters(file.committers.iter().cloned().collect())),
        Arc::new(StaticAccounts::from_entries(&file.accounts)),
        Arc::new(directory),
    );
    if let Some(url) = docs_url {
        validator = validator.with_docs_url(url);
    }

    let pusher = pusher_identity(&file.pusher);
    let mut rejected = false;
    for commit in &file.commits {
        let outcome = validator
            .validate(&file.project, &pusher, commit)
            .await
            .context("Commit validation could not be completed")?;
        render(&outcome);
        rejected |= !outcome.passed();
    }

    if rejected {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_delegate(
    submission: &PathBuf,
    repo_url: &str,
    provider: &str,
    strict: bool,
    docs_url: Option<&str>,
) -> Result<()> {
    let file = load_submission(submission)?;
    let config = ServiceConfig::from_env().context("Service configuration is incomplete")?;

    let provider = match provider {
        "gerrit" => ProviderType::Gerrit,
        "github" => ProviderType::Github,
        "gitlab" => ProviderType::Gitlab,
        other => bail!("unknown provider: {other}"),
    };
    let request = ValidationRequest {
        repo_url: repo_url.to_string(),
        provider,
        commits: file.commits.iter().map(RequestCommit::from).collect(),
        strict_mode: strict,
    };

    let mut validator = DelegatedValidator::new(&config.base_url, config.call_timeout);
    if let Some(url) = docs_url {
        validator = validator.with_docs_url(url);
    }

    let outcomes = validator
        .validate(&request)
        .await
        .context("Delegated validation could not be completed")?;

    let mut rejected = false;
    for commit in &file.commits {
        if let Some(outcome) = outcomes.get(&commit.hash) {
            render(outcome);
            rejected |= !outcome.passed();
        }
    }

    if rejected {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_token() -> Result<()> {
    let config = ServiceConfig::from_env().context("Service configuration is incomplete")?;
    let manager = TokenManager::new(Arc::new(OAuthTokenEndpoint::from_config(config)));

    match manager.refresh().await {
        Some(token) => {
            println!(
                "token acquired: expires in {}s, scope \"{}\"",
                token.expires_in_seconds(),
                token.scope()
            );
            Ok(())
        }
        None => bail!("could not obtain a token with the configured credentials"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_file_parses() {
        let raw = r#"{
            "project": "tools.widgets",
            "pusher": {"name": "Bob", "mail": "bob@example.org", "username": "bob"},
            "commits": [{
                "hash": "0123456789abcdef0123456789abcdef01234567",
                "subject": "Add widget",
                "body": "Add widget",
                "parents": [],
                "author": {"name": "Ada", "mail": "ada@example.org"},
                "committer": {"name": "Ada", "mail": "ada@example.org"},
                "trailer_lines": ["Signed-off-by: Ada <ada@example.org>"]
            }],
            "committers": ["bob"],
            "accounts": [{"username": "ada", "emails": ["ada@example.org"]}]
        }"#;
        let file: SubmissionFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.project, "tools.widgets");
        assert_eq!(file.commits.len(), 1);
        assert_eq!(file.committers, vec!["bob".to_string()]);
    }

    #[test]
    fn load_submission_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.json");
        std::fs::write(
            &path,
            r#"{
                "project": "tools.widgets",
                "pusher": {"name": "Bob", "mail": "bob@example.org"},
                "commits": []
            }"#,
        )
        .unwrap();
        let file = load_submission(&path).unwrap();
        assert_eq!(file.project, "tools.widgets");
        assert!(file.committers.is_empty());
        assert!(file.accounts.is_empty());
    }

    #[test]
    fn account_index_covers_usernames_and_emails() {
        let accounts = StaticAccounts::from_entries(&[AccountEntry {
            username: "ada".to_string(),
            emails: vec!["ada@example.org".to_string(), "ada@work.example".to_string()],
        }]);
        assert!(accounts.0.contains_key("ada"));
        assert!(accounts.0.contains_key("ada@example.org"));
        assert!(accounts.0.contains_key("ada@work.example"));
    }
}
