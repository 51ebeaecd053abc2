//! Authenticating request protocol: bounded, idempotent retry-on-401.
//!
//! Every request to the profile service carries `Authorization: Bearer
//! <token>`. When a response comes back 401, [`BearerAuthenticator`]
//! decides, under a single mutual-exclusion region per client instance,
//! whether to retry and with which header:
//!
//! - at most three responses per logical request;
//! - a request that failed with the *currently cached* token triggers one
//!   refresh; concurrent requests that failed with an older token piggyback
//!   on the already-refreshed cache instead of refreshing again;
//! - a refresh that yields no token gives the request up.
//!
//! This bounds the protocol to one network refresh per distinct
//! stale-token generation and prevents refresh storms.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::debug;

use contribgate_core::ResolutionError;

use crate::token::TokenManager;

/// A logical request gives up once this many responses have been seen.
pub const MAX_AUTH_RESPONSES: u32 = 3;

/// Decides retry headers for challenged requests.
pub struct BearerAuthenticator {
    tokens: Arc<TokenManager>,
    gate: Mutex<()>,
}

impl BearerAuthenticator {
    pub fn new(tokens: Arc<TokenManager>) -> Self {
        Self {
            tokens,
            gate: Mutex::new(()),
        }
    }

    /// Decide the `Authorization` header for retrying a request that was
    /// just challenged with 401. `None` means give up: the original
    /// request fails.
    ///
    /// `prior_authorization` is the header the failed request carried, if
    /// any; `responses_seen` counts the responses in this request's retry
    /// chain, the challenge included.
    pub async fn on_challenge(
        &self,
        prior_authorization: Option<&str>,
        responses_seen: u32,
    ) -> Option<String> {
        // Single-flight region: token comparison and refresh must not
        // interleave across requests, or two holders of the same stale
        // token would both refresh.
        let _guard = self.gate.lock().await;

        if responses_seen >= MAX_AUTH_RESPONSES {
            debug!(event = "auth.gave_up", responses_seen = responses_seen);
            return None;
        }

        match prior_authorization {
            Some(header) => match self.tokens.current().await {
                // The cached token itself was rejected by the server.
                Some(cached) if cached.bearer() == header => {
                    debug!(event = "auth.refreshing_stale_token");
                    self.tokens.refresh().await.map(|t| t.bearer())
                }
                // The request failed with a token that is no longer the
                // cached one; a concurrent refresh already happened.
                Some(cached) => {
                    debug!(event = "auth.retrying_with_current_token");
                    Some(cached.bearer())
                }
                None => None,
            },
            // First authentication attempt for this logical request.
            None => match self.tokens.current().await {
                Some(token) => Some(token.bearer()),
                None => self.tokens.refresh().await.map(|t| t.bearer()),
            },
        }
    }
}

/// HTTP client wrapper that drives the challenge/retry loop.
pub struct AuthenticatedClient {
    http: reqwest::Client,
    authenticator: BearerAuthenticator,
}

impl AuthenticatedClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            authenticator: BearerAuthenticator::new(tokens),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send a request, replaying it with fresh credentials on 401 until it
    /// succeeds or the protocol gives up.
    ///
    /// `build` constructs a fresh request for each attempt. Only the
    /// operation name and status reach the logs; Authorization values
    /// never do.
    pub async fn send_with_auth<F>(
        &self,
        operation: &str,
        build: F,
    ) -> Result<reqwest::Response, ResolutionError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut authorization: Option<String> = None;
        let mut responses_seen: u32 = 0;

        loop {
            let mut request = build(&self.http);
            if let Some(header) = &authorization {
                request = request.header(AUTHORIZATION, header);
            }
            let response = request
                .send()
                .await
                .map_err(|e| ResolutionError::Transport(e.to_string()))?;
            responses_seen += 1;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }
            debug!(
                event = "auth.challenged",
                operation = operation,
                responses_seen = responses_seen,
            );

            match self
                .authenticator
                .on_challenge(authorization.as_deref(), responses_seen)
                .await
            {
                Some(header) => authorization = Some(header),
                None => return Err(ResolutionError::AuthExhausted),
            }
        }
    }
}
