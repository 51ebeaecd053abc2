//! Seams between the decision engine and its collaborators.
//!
//! The orchestrator only sees traits here, so either evaluation strategy
//! (per-check resolution against the remote profile service, or fully
//! delegated batch validation) can sit behind the same boundary, and hosts
//! plug in their own account and permission stores.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{Identity, ResolutionError};

/// A local platform account matched to an email address or username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAccount {
    pub username: String,
    /// Every email address registered with the account.
    pub emails: BTreeSet<String>,
}

/// Host-side account lookup.
///
/// Used to enrich a commit author's identity with the username and
/// secondary email addresses of their platform account before the
/// authorization checks run.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Resolve an email address or username to a local account, if any.
    async fn resolve(&self, email_or_username: &str) -> Option<LocalAccount>;
}

/// Host-side committer predicate.
///
/// The host platform decides who holds submit rights on a project; the
/// gate treats the answer as authoritative and never caches it.
#[async_trait]
pub trait CommitterRegistry: Send + Sync {
    async fn is_committer(&self, identity: &Identity, project: &str) -> bool;
}

/// Agreement and bot-exemption capability of the profile service.
///
/// Implementations may resolve each question locally (fan-out queries with
/// any-match reduction) or delegate the whole decision to a remote
/// endpoint, as long as the observable semantics hold: any matching record
/// answers `true`, and infrastructure failures surface as
/// [`ResolutionError`] rather than `false`.
#[async_trait]
pub trait AuthoritySource: Send + Sync {
    /// Whether the identity has a signed contributor agreement on file.
    async fn has_signed_agreement(&self, identity: &Identity) -> Result<bool, ResolutionError>;

    /// Whether the identity is a registered automation account whose
    /// registered or linked email matches the commit email.
    async fn is_bot_exempt(&self, identity: &Identity) -> Result<bool, ResolutionError>;
}

impl LocalAccount {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            emails: BTreeSet::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.emails.insert(email.into());
        self
    }
}
