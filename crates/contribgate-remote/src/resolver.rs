//! Candidate resolver: concurrent identity-matching with any-match
//! reduction.
//!
//! A possibly-ambiguous identity (username plus one or more known emails)
//! maps to several candidate queries against the profile service. The
//! queries run concurrently and reduce with any-match semantics:
//!
//! - `true` as soon as any single result satisfies the predicate, without
//!   waiting for the remaining in-flight queries and without cancelling
//!   them (they run to completion and their results are discarded);
//! - `false` when every query completed and none matched;
//! - a query failure surfaces only once all queries are accounted for and
//!   still no match was found. A pending success always beats reporting
//!   an error.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use contribgate_core::{AuthoritySource, Identity, ResolutionError};

use crate::api::{ProfileService, UserProfile};

/// Reduce concurrent queries with any-match semantics.
///
/// Spawns every query as its own task and reads results as they arrive;
/// the first satisfying result wins regardless of candidate order. The
/// reduction is race-free under concurrent completion: the single reducer
/// is the only writer of the verdict, so later completions are no-ops.
pub async fn any_match<T, F, P>(queries: Vec<F>, predicate: P) -> Result<bool, ResolutionError>
where
    F: std::future::Future<Output = Result<T, ResolutionError>> + Send + 'static,
    T: Send + 'static,
    P: Fn(&T) -> bool,
{
    let total = queries.len();
    if total == 0 {
        return Ok(false);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    for query in queries {
        let tx = tx.clone();
        tokio::spawn(async move {
            // Send failure means the reduction already resolved; the
            // straggler's result is discarded.
            let _ = tx.send(query.await);
        });
    }
    drop(tx);

    let mut first_error: Option<ResolutionError> = None;
    let mut seen = 0;
    while let Some(result) = rx.recv().await {
        seen += 1;
        match result {
            Ok(value) if predicate(&value) => return Ok(true),
            Ok(_) => {}
            Err(e) => {
                debug!(event = "resolver.query_failed", error = %e);
                first_error.get_or_insert(e);
            }
        }
        if seen == total {
            break;
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(false),
    }
}

/// Per-check resolution against the remote profile service.
///
/// The production [`AuthoritySource`]: agreement status from profile
/// records, bot exemption from the bot registry, both via any-match
/// fan-out over the identity's candidates.
pub struct RemoteDirectory<S> {
    service: Arc<S>,
}

impl<S: ProfileService + 'static> RemoteDirectory<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: ProfileService + 'static> AuthoritySource for RemoteDirectory<S> {
    /// Profile-by-username first when a username is known; a successful
    /// answer is authoritative either way. Otherwise one concurrent
    /// profile search per distinct known email.
    async fn has_signed_agreement(&self, identity: &Identity) -> Result<bool, ResolutionError> {
        if let Some(username) = identity.username() {
            if let Some(profile) = self.service.profile_by_name(username).await? {
                info!(
                    event = "resolver.agreement_decided",
                    via = "username",
                    signed = profile.agreement.signed,
                );
                return Ok(profile.agreement.signed);
            }
        }

        let queries: Vec<_> = identity
            .known_emails()
            .map(|mail| {
                let service = Arc::clone(&self.service);
                let mail = mail.to_string();
                async move { service.search_by_mail(&mail).await }
            })
            .collect();

        let signed = any_match(queries, |profiles: &Vec<UserProfile>| {
            profiles.iter().any(|p| p.agreement.signed)
        })
        .await?;
        info!(event = "resolver.agreement_decided", via = "email", signed = signed);
        Ok(signed)
    }

    /// Bot-registry search by username when known, else by every known
    /// email. Exemption requires a registered or linked email equal to the
    /// commit email.
    async fn is_bot_exempt(&self, identity: &Identity) -> Result<bool, ResolutionError> {
        let commit_email = identity.primary_email().to_string();
        let candidates: Vec<String> = match identity.username() {
            Some(username) => vec![username.to_string()],
            None => identity.known_emails().map(str::to_string).collect(),
        };

        let queries: Vec<_> = candidates
            .into_iter()
            .map(|candidate| {
                let service = Arc::clone(&self.service);
                let email = commit_email.clone();
                async move {
                    service
                        .bots(&candidate)
                        .await
                        .map(|bots| bots.iter().any(|bot| bot.matches_email(&email)))
                }
            })
            .collect();

        let exempt = any_match(queries, |matched: &bool| *matched).await?;
        info!(event = "resolver.bot_exemption_decided", exempt = exempt);
        Ok(exempt)
    }
}
