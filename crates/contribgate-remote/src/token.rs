//! OAuth client-credentials token lifecycle.
//!
//! This module provides:
//! - [`AccessToken`]: the opaque bearer token returned by the token endpoint
//! - [`TokenStore`]: the single cached-token slot, safe under concurrent
//!   read/refresh
//! - [`TokenManager`]: obtains and refreshes tokens through a
//!   [`TokenFetcher`], never caching a partial token
//!
//! A failed refresh is not retried here; the authenticating request
//! protocol (see [`crate::authenticator`]) decides whether the outer
//! request is retried.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::TokenError;

/// A bearer token issued by the token endpoint.
///
/// Treated as opaque and immutable. Equality is by bearer header value,
/// which is how the retry protocol detects that a request failed with the
/// currently cached token generation.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    token: String,
    #[serde(rename = "expires_in")]
    expires_in_seconds: u64,
    #[serde(rename = "token_type")]
    token_type: String,
    scope: String,
}

impl AccessToken {
    pub fn new(
        token: impl Into<String>,
        expires_in_seconds: u64,
        token_type: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            expires_in_seconds,
            token_type: token_type.into(),
            scope: scope.into(),
        }
    }

    /// The `Authorization` header value: `<token_type> <token>`.
    pub fn bearer(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }

    pub fn expires_in_seconds(&self) -> u64 {
        self.expires_in_seconds
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.token_type == other.token_type && self.token == other.token
    }
}

impl Eq for AccessToken {}

// The token value must never reach the logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in_seconds", &self.expires_in_seconds)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// The single cached-token slot.
///
/// Zero or one token; read-mostly; replaced atomically so a reader never
/// observes a half-written token.
#[derive(Debug, Default)]
pub struct TokenStore {
    slot: RwLock<Option<AccessToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, if any.
    pub async fn current(&self) -> Option<AccessToken> {
        self.slot.read().await.clone()
    }

    /// Replace the cached token.
    pub async fn replace(&self, token: AccessToken) {
        *self.slot.write().await = Some(token);
    }
}

/// Async seam to the token endpoint.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self) -> Result<AccessToken, TokenError>;
}

/// Production fetcher: posts the client-credentials grant as a form to the
/// configured token endpoint.
pub struct OAuthTokenEndpoint {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl OAuthTokenEndpoint {
    pub fn new(http: reqwest::Client, config: ServiceConfig) -> Self {
        Self { http, config }
    }

    /// Build a fetcher with its own HTTP client, bounded by the config's
    /// call timeout.
    pub fn from_config(config: ServiceConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("contribgate/", env!("CARGO_PKG_VERSION")))
            .timeout(config.call_timeout)
            .build()
            .expect("failed to create HTTP client");
        Self::new(http, config)
    }
}

#[async_trait]
impl TokenFetcher for OAuthTokenEndpoint {
    async fn fetch(&self) -> Result<AccessToken, TokenError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", self.config.grant_type.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", self.config.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::Status(status.as_u16()));
        }

        response
            .json::<AccessToken>()
            .await
            .map_err(|e| TokenError::Decode(e.to_string()))
    }
}

/// Obtains and refreshes tokens, wrapping the [`TokenStore`].
///
/// `current` is non-blocking; `refresh` awaits the fetcher and on success
/// replaces the cached token. On any transport or decoding failure the
/// previous cached value, if any, is left untouched and `None` is
/// returned; no partial or garbage token is ever cached.
pub struct TokenManager {
    fetcher: Arc<dyn TokenFetcher>,
    store: TokenStore,
}

impl TokenManager {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            fetcher,
            store: TokenStore::new(),
        }
    }

    /// The cached token, if any. Never touches the network.
    pub async fn current(&self) -> Option<AccessToken> {
        self.store.current().await
    }

    /// Fetch a fresh token from the endpoint.
    pub async fn refresh(&self) -> Option<AccessToken> {
        match self.fetcher.fetch().await {
            Ok(token) => {
                debug!(
                    event = "token.refreshed",
                    expires_in = token.expires_in_seconds(),
                );
                self.store.replace(token.clone()).await;
                Some(token)
            }
            Err(e) => {
                warn!(event = "token.refresh_failed", error = %e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct ScriptedFetcher {
        calls: AtomicU32,
        fail: bool,
    }

    impl ScriptedFetcher {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl TokenFetcher for ScriptedFetcher {
        async fn fetch(&self) -> Result<AccessToken, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                Err(TokenError::Status(500))
            } else {
                Ok(AccessToken::new(
                    format!("tok-{n}"),
                    3600,
                    "Bearer",
                    "view_all_profiles",
                ))
            }
        }
    }

    #[test]
    fn bearer_joins_type_and_token() {
        let token = AccessToken::new("abc", 3600, "Bearer", "s");
        assert_eq!(token.bearer(), "Bearer abc");
    }

    #[test]
    fn equality_is_by_bearer_value() {
        let a = AccessToken::new("abc", 3600, "Bearer", "s");
        let b = AccessToken::new("abc", 60, "Bearer", "other-scope");
        let c = AccessToken::new("def", 3600, "Bearer", "s");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn debug_redacts_the_token() {
        let token = AccessToken::new("super-secret", 3600, "Bearer", "s");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn decodes_token_endpoint_response() {
        let token: AccessToken = serde_json::from_str(
            r#"{"access_token":"abc","expires_in":3600,"token_type":"Bearer","scope":"view_all_profiles"}"#,
        )
        .unwrap();
        assert_eq!(token.bearer(), "Bearer abc");
        assert_eq!(token.expires_in_seconds(), 3600);
    }

    #[tokio::test]
    async fn refresh_replaces_the_cached_token() {
        let manager = TokenManager::new(Arc::new(ScriptedFetcher::new(false)));
        assert!(manager.current().await.is_none());

        let first = manager.refresh().await.unwrap();
        assert_eq!(manager.current().await.unwrap(), first);

        let second = manager.refresh().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(manager.current().await.unwrap(), second);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_token() {
        let manager = TokenManager::new(Arc::new(ScriptedFetcher::new(false)));
        let cached = manager.refresh().await.unwrap();

        let failing = TokenManager {
            fetcher: Arc::new(ScriptedFetcher::new(true)),
            store: TokenStore::new(),
        };
        failing.store.replace(cached.clone()).await;

        assert!(failing.refresh().await.is_none());
        assert_eq!(failing.current().await.unwrap(), cached);
    }
}
