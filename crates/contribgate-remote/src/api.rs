//! Profile, agreement, and bot-registry API surface.
//!
//! Wire DTOs for the remote service plus the [`ProfileService`] seam the
//! candidate resolver fans out against. The production implementation,
//! [`ProfileClient`], issues authenticated requests through
//! [`AuthenticatedClient`]; tests substitute fakes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use contribgate_core::ResolutionError;

use crate::authenticator::AuthenticatedClient;
use crate::config::ServiceConfig;
use crate::token::{OAuthTokenEndpoint, TokenManager};

/// Agreement state attached to a profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementStatus {
    pub signed: bool,
    #[serde(rename = "can_contribute_spec_project")]
    pub spec_project_eligible: bool,
}

/// A profile record returned by the by-name and search endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: u64,
    pub name: String,
    pub mail: Option<String>,
    #[serde(rename = "eca")]
    pub agreement: AgreementStatus,
    #[serde(rename = "is_committer")]
    pub is_committer: bool,
}

/// A linked external-service account on a bot registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotServiceAccount {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// A bot-registry record.
///
/// Linked external-service accounts arrive as additional top-level keys
/// (`"github.com"`, `"github.com-dependabot"`, …); the flattened map
/// captures them all without enumerating services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRecord {
    pub id: u64,
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(flatten)]
    pub linked_accounts: BTreeMap<String, BotServiceAccount>,
}

impl BotRecord {
    /// Whether this registration covers the given commit email: the bot's
    /// own email or any linked account email must equal it.
    pub fn matches_email(&self, email: &str) -> bool {
        if self.email.as_deref() == Some(email) {
            return true;
        }
        self.linked_accounts
            .values()
            .any(|account| account.email.as_deref() == Some(email))
    }
}

/// The remote service operations the resolver needs.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Profile lookup by username. `Ok(None)` when the service answers
    /// unsuccessfully for the name (the caller falls back to email search).
    async fn profile_by_name(&self, username: &str)
        -> Result<Option<UserProfile>, ResolutionError>;

    /// Profile search by email address.
    async fn search_by_mail(&self, mail: &str) -> Result<Vec<UserProfile>, ResolutionError>;

    /// Bot-registry search.
    async fn bots(&self, query: &str) -> Result<Vec<BotRecord>, ResolutionError>;
}

/// Authenticated client for the profile service.
pub struct ProfileClient {
    client: AuthenticatedClient,
    base_url: String,
}

impl ProfileClient {
    /// Build a client from configuration: one shared HTTP client with the
    /// per-call timeout, a token manager bound to the token endpoint, and
    /// the challenge/retry protocol wired in between.
    pub fn new(config: ServiceConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("contribgate/", env!("CARGO_PKG_VERSION")))
            .timeout(config.call_timeout)
            .build()
            .expect("failed to create HTTP client");

        let base_url = config.base_url.clone();
        // Token requests go out on the same client but bypass the
        // authenticator; only profile-service requests are challenged.
        let tokens = Arc::new(TokenManager::new(Arc::new(OAuthTokenEndpoint::new(
            http.clone(),
            config,
        ))));

        Self {
            client: AuthenticatedClient::new(http, tokens),
            base_url,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T, ResolutionError> {
        response.json::<T>().await.map_err(|e| ResolutionError::Decode {
            operation: operation.to_string(),
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl ProfileService for ProfileClient {
    async fn profile_by_name(
        &self,
        username: &str,
    ) -> Result<Option<UserProfile>, ResolutionError> {
        let operation = "profile-by-name";
        let url = format!("{}/account/profile/{}", self.base_url, username);
        let response = self
            .client
            .send_with_auth(operation, |http| http.get(&url))
            .await?;

        let status = response.status();
        if !status.is_success() {
            // An unsuccessful by-name answer is not authoritative; the
            // resolver falls back to searching by email.
            debug!(event = "api.profile_by_name_miss", status = status.as_u16());
            return Ok(None);
        }
        Ok(Some(Self::decode(operation, response).await?))
    }

    async fn search_by_mail(&self, mail: &str) -> Result<Vec<UserProfile>, ResolutionError> {
        let operation = "profile-search";
        let url = format!("{}/account/profile", self.base_url);
        let response = self
            .client
            .send_with_auth(operation, |http| http.get(&url).query(&[("mail", mail)]))
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ResolutionError::UnexpectedStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }
        Self::decode(operation, response).await
    }

    async fn bots(&self, query: &str) -> Result<Vec<BotRecord>, ResolutionError> {
        let operation = "bots";
        let url = format!("{}/bots", self.base_url);
        let response = self
            .client
            .send_with_auth(operation, |http| http.get(&url).query(&[("q", query)]))
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ResolutionError::UnexpectedStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }
        Self::decode(operation, response).await
    }
}
