use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use contribgate_core::{AuthoritySource, Identity, ResolutionError};
use contribgate_remote::{
    any_match, AgreementStatus, BotRecord, ProfileService, RemoteDirectory, UserProfile,
};

fn profile(signed: bool) -> UserProfile {
    UserProfile {
        uid: 1,
        name: "ada".to_string(),
        mail: Some("ada@example.org".to_string()),
        agreement: AgreementStatus {
            signed,
            spec_project_eligible: false,
        },
        is_committer: false,
    }
}

fn transport() -> ResolutionError {
    ResolutionError::Transport("connection reset".to_string())
}

type Query<T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<T, ResolutionError>> + Send>>;

// ---- any_match reduction ----

#[tokio::test]
async fn first_match_wins_without_waiting_for_stragglers() {
    // The matching query answers immediately; the straggler would hold the
    // reduction for a minute if it were awaited.
    let queries: Vec<Query<u32>> = vec![
        Box::pin(async { Ok(7) }),
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0)
        }),
    ];
    let started = std::time::Instant::now();
    let result = any_match(queries, |v| *v == 7).await.unwrap();
    assert!(result);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn late_failures_are_ignored_after_a_match() {
    let queries: Vec<Query<bool>> = vec![
        Box::pin(async { Ok(true) }),
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(transport())
        }),
    ];
    assert!(any_match(queries, |v| *v).await.unwrap());
}

#[tokio::test]
async fn match_wins_even_when_an_earlier_query_failed() {
    // The failure arrives first; the verdict must still favor the pending
    // success over reporting an error.
    let queries: Vec<Query<bool>> = vec![
        Box::pin(async { Err(transport()) }),
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(true)
        }),
    ];
    assert!(any_match(queries, |v| *v).await.unwrap());
}

#[tokio::test]
async fn no_match_resolves_false() {
    let queries: Vec<_> = (0..4)
        .map(|_| async { Ok::<bool, ResolutionError>(false) })
        .collect();
    assert!(!any_match(queries, |v| *v).await.unwrap());
}

#[tokio::test]
async fn all_failed_surfaces_the_error_not_false() {
    let queries: Vec<_> = (0..3).map(|_| async { Err::<bool, _>(transport()) }).collect();
    let result = any_match(queries, |v: &bool| *v).await;
    assert!(matches!(result, Err(ResolutionError::Transport(_))));
}

#[tokio::test]
async fn partial_failure_without_match_surfaces_the_error() {
    let queries: Vec<Query<bool>> = vec![
        Box::pin(async { Ok(false) }),
        Box::pin(async { Err(transport()) }),
    ];
    assert!(any_match(queries, |v| *v).await.is_err());
}

#[tokio::test]
async fn empty_candidate_set_resolves_false() {
    let queries: Vec<Query<bool>> = Vec::new();
    assert!(!any_match(queries, |v| *v).await.unwrap());
}

// ---- remote directory: agreement resolution ----

/// Scripted profile service: per-email results, optional username answer,
/// and a call counter for the bots endpoint.
struct ScriptedService {
    by_name: Option<Option<UserProfile>>,
    by_mail: std::collections::HashMap<String, Result<Vec<UserProfile>, ()>>,
    bots: Vec<BotRecord>,
    bot_calls: AtomicU32,
}

impl ScriptedService {
    fn without_username() -> Self {
        Self {
            by_name: None,
            by_mail: std::collections::HashMap::new(),
            bots: Vec::new(),
            bot_calls: AtomicU32::new(0),
        }
    }

    fn mail(mut self, mail: &str, result: Result<Vec<UserProfile>, ()>) -> Self {
        self.by_mail.insert(mail.to_string(), result);
        self
    }
}

#[async_trait]
impl ProfileService for ScriptedService {
    async fn profile_by_name(
        &self,
        _username: &str,
    ) -> Result<Option<UserProfile>, ResolutionError> {
        match &self.by_name {
            Some(answer) => Ok(answer.clone()),
            None => Ok(None),
        }
    }

    async fn search_by_mail(&self, mail: &str) -> Result<Vec<UserProfile>, ResolutionError> {
        match self.by_mail.get(mail) {
            Some(Ok(profiles)) => Ok(profiles.clone()),
            Some(Err(())) => Err(transport()),
            None => Ok(Vec::new()),
        }
    }

    async fn bots(&self, _query: &str) -> Result<Vec<BotRecord>, ResolutionError> {
        self.bot_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bots.clone())
    }
}

#[tokio::test]
async fn any_signed_email_grants_the_agreement() {
    let service = ScriptedService::without_username()
        .mail("ada@example.org", Ok(vec![profile(false)]))
        .mail("ada@work.example", Ok(vec![profile(true)]));
    let directory = RemoteDirectory::new(Arc::new(service));
    let identity =
        Identity::new("Ada", "ada@example.org").with_known_email("ada@work.example");

    assert!(directory.has_signed_agreement(&identity).await.unwrap());
}

#[tokio::test]
async fn no_signed_record_anywhere_resolves_false() {
    let service = ScriptedService::without_username()
        .mail("ada@example.org", Ok(vec![profile(false)]))
        .mail("ada@work.example", Ok(Vec::new()));
    let directory = RemoteDirectory::new(Arc::new(service));
    let identity =
        Identity::new("Ada", "ada@example.org").with_known_email("ada@work.example");

    assert!(!directory.has_signed_agreement(&identity).await.unwrap());
}

#[tokio::test]
async fn one_failing_search_is_tolerated_when_another_matches() {
    let service = ScriptedService::without_username()
        .mail("ada@example.org", Err(()))
        .mail("ada@work.example", Ok(vec![profile(true)]));
    let directory = RemoteDirectory::new(Arc::new(service));
    let identity =
        Identity::new("Ada", "ada@example.org").with_known_email("ada@work.example");

    assert!(directory.has_signed_agreement(&identity).await.unwrap());
}

#[tokio::test]
async fn successful_username_lookup_is_authoritative() {
    // The by-name answer is unsigned; the email search would say signed,
    // but must not run.
    let mut service = ScriptedService::without_username()
        .mail("ada@example.org", Ok(vec![profile(true)]));
    service.by_name = Some(Some(profile(false)));
    let directory = RemoteDirectory::new(Arc::new(service));
    let identity = Identity::new("Ada", "ada@example.org").with_username("ada");

    assert!(!directory.has_signed_agreement(&identity).await.unwrap());
}

#[tokio::test]
async fn missing_username_record_falls_back_to_email_search() {
    let mut service = ScriptedService::without_username()
        .mail("ada@example.org", Ok(vec![profile(true)]));
    service.by_name = Some(None);
    let directory = RemoteDirectory::new(Arc::new(service));
    let identity = Identity::new("Ada", "ada@example.org").with_username("ada");

    assert!(directory.has_signed_agreement(&identity).await.unwrap());
}

// ---- remote directory: bot exemption ----

fn bot(email: Option<&str>, linked_email: Option<&str>) -> BotRecord {
    let mut linked_accounts = std::collections::BTreeMap::new();
    if let Some(mail) = linked_email {
        linked_accounts.insert(
            "github.com".to_string(),
            contribgate_remote::BotServiceAccount {
                username: Some("widgets-bot".to_string()),
                email: Some(mail.to_string()),
            },
        );
    }
    BotRecord {
        id: 7,
        project_id: "tools.widgets".to_string(),
        username: "widgets-bot".to_string(),
        email: email.map(|e| e.to_string()),
        linked_accounts,
    }
}

#[tokio::test]
async fn linked_account_email_grants_bot_exemption() {
    let mut service = ScriptedService::without_username();
    service.bots = vec![bot(None, Some("bot@example.org"))];
    let directory = RemoteDirectory::new(Arc::new(service));
    let identity = Identity::new("Widgets Bot", "bot@example.org").with_username("widgets-bot");

    assert!(directory.is_bot_exempt(&identity).await.unwrap());
}

#[tokio::test]
async fn bot_with_unrelated_emails_is_not_an_exemption() {
    let mut service = ScriptedService::without_username();
    service.bots = vec![bot(Some("other@example.org"), Some("alsoother@example.org"))];
    let directory = RemoteDirectory::new(Arc::new(service));
    let identity = Identity::new("Widgets Bot", "bot@example.org").with_username("widgets-bot");

    assert!(!directory.is_bot_exempt(&identity).await.unwrap());
}

#[tokio::test]
async fn username_limits_bot_search_to_one_query() {
    let mut service = ScriptedService::without_username();
    service.bots = vec![bot(Some("bot@example.org"), None)];
    let service = Arc::new(service);
    let directory = RemoteDirectory::new(Arc::clone(&service));
    let identity = Identity::new("Widgets Bot", "bot@example.org")
        .with_username("widgets-bot")
        .with_known_email("bot-alt@example.org");

    assert!(directory.is_bot_exempt(&identity).await.unwrap());
    assert_eq!(service.bot_calls.load(Ordering::SeqCst), 1);
}
