//! Delegated batch validation.
//!
//! Instead of resolving each check locally, a host may submit the whole
//! commit batch to a single validation endpoint and map the response back
//! onto [`ValidationOutcome`] semantics: committer bypass,
//! agreement-or-bot-exemption, sign-off, and delegation are all decided by
//! the service. The observable decision contract is the same as the
//! per-check path behind [`crate::resolver::RemoteDirectory`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use contribgate_core::{CommitSubmission, GitPerson, ResolutionError, ValidationOutcome};

/// Host platform submitting commits for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Gerrit,
    Github,
    Gitlab,
}

/// One commit in the request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCommit {
    pub hash: String,
    pub subject: String,
    pub body: String,
    pub parents: Vec<String>,
    pub author: GitPerson,
    pub committer: GitPerson,
}

impl From<&CommitSubmission> for RequestCommit {
    fn from(commit: &CommitSubmission) -> Self {
        Self {
            hash: commit.hash.clone(),
            subject: commit.subject.clone(),
            body: commit.body.clone(),
            parents: commit.parents.clone(),
            author: commit.author.clone(),
            committer: commit.committer.clone(),
        }
    }
}

/// The batch submitted to the validation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub repo_url: String,
    pub provider: ProviderType,
    pub commits: Vec<RequestCommit>,
    pub strict_mode: bool,
}

/// A message with an associated status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub code: i32,
    pub message: String,
}

impl StatusMessage {
    /// Negative codes are error-family statuses.
    pub fn is_error(&self) -> bool {
        self.code < 0
    }
}

/// Well-known status codes used by the validation endpoint.
pub mod status_code {
    pub const SUCCESS_DEFAULT: i32 = 200;
    pub const SUCCESS_COMMITTER: i32 = 201;
    pub const SUCCESS_CONTRIBUTOR: i32 = 202;
    pub const ERROR_DEFAULT: i32 = -401;
    pub const ERROR_SIGN_OFF: i32 = -402;
    pub const ERROR_SPEC_PROJECT: i32 = -403;
}

/// Per-commit result in the response payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitStatus {
    #[serde(default)]
    pub messages: Vec<StatusMessage>,
    #[serde(default)]
    pub warnings: Vec<StatusMessage>,
    #[serde(default)]
    pub errors: Vec<StatusMessage>,
}

/// The validation endpoint's response for a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub passed: bool,
    pub error_count: u32,
    pub time: String,
    pub commits: BTreeMap<String, CommitStatus>,
    pub tracked_project: bool,
}

/// Client for the delegated validation endpoint.
///
/// The endpoint itself decides authorization, so requests are not
/// bearer-authenticated; only the call timeout applies.
pub struct DelegatedValidator {
    http: reqwest::Client,
    endpoint: String,
    docs_url: String,
}

impl DelegatedValidator {
    pub fn new(base_url: &str, call_timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("contribgate/", env!("CARGO_PKG_VERSION")))
            .timeout(call_timeout)
            .build()
            .expect("failed to create HTTP client");
        Self {
            http,
            endpoint: format!("{}/eca/validate", base_url.trim_end_matches('/')),
            docs_url: "https://docs.contribgate.dev/contributing".to_string(),
        }
    }

    /// Override the documentation pointer appended to rejections.
    pub fn with_docs_url(mut self, docs_url: impl Into<String>) -> Self {
        self.docs_url = docs_url.into();
        self
    }

    /// Submit a batch and map the response to per-commit outcomes.
    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<BTreeMap<String, ValidationOutcome>, ResolutionError> {
        let operation = "delegated-validate";
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ResolutionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::UnexpectedStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }
        let decoded: ValidationResponse =
            response
                .json()
                .await
                .map_err(|e| ResolutionError::Decode {
                    operation: operation.to_string(),
                    detail: e.to_string(),
                })?;

        info!(
            event = "delegated.validated",
            passed = decoded.passed,
            error_count = decoded.error_count,
            tracked_project = decoded.tracked_project,
        );
        Ok(map_response(request, &decoded, &self.docs_url))
    }
}

/// Map a batch response onto one [`ValidationOutcome`] per submitted
/// commit, preserving request order via the submitted hashes.
///
/// Error-family codes render as error-severity diagnostics, and the
/// response's error messages become blocking errors, only when the project
/// is tracked: untracked projects get informational output and always
/// pass.
pub fn map_response(
    request: &ValidationRequest,
    response: &ValidationResponse,
    docs_url: &str,
) -> BTreeMap<String, ValidationOutcome> {
    let mut outcomes = BTreeMap::new();
    for commit in &request.commits {
        let mut outcome = ValidationOutcome::new();
        outcome.push_note("----------");
        outcome.push_note(format!(
            "Reviewing commit: {}",
            &commit.hash[..commit.hash.len().min(8)]
        ));
        outcome.push_note(format!(
            "Authored by: {} <{}>",
            commit.author.name, commit.author.mail
        ));
        outcome.push_note("");

        if let Some(commit_status) = response.commits.get(&commit.hash) {
            for message in &commit_status.messages {
                if message.is_error() && response.tracked_project {
                    outcome.push_error(
                        contribgate_core::ValidationStep::AgreementCheck,
                        message.message.clone(),
                    );
                } else {
                    outcome.push_note(message.message.clone());
                }
            }
            if response.error_count > 0 && response.tracked_project {
                for error in &commit_status.errors {
                    outcome.block(error.message.clone());
                }
            }
        }

        if outcome.passed() {
            outcome.push_note("This commit passes validation.");
        } else {
            outcome.push_note(format!("Please see {docs_url}"));
        }
        outcomes.insert(commit.hash.clone(), outcome);
    }
    outcomes
}
