//! Service configuration.
//!
//! Connection settings for the profile/agreement service and its OAuth
//! token endpoint. Values come from the environment by default; hosts with
//! their own configuration store can construct [`ServiceConfig`] directly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_BASE_URL: &str = "CONTRIBGATE_API_URL";
const ENV_TOKEN_URL: &str = "CONTRIBGATE_TOKEN_URL";
const ENV_CLIENT_ID: &str = "CONTRIBGATE_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "CONTRIBGATE_CLIENT_SECRET";
const ENV_GRANT_TYPE: &str = "CONTRIBGATE_GRANT_TYPE";
const ENV_SCOPE: &str = "CONTRIBGATE_SCOPE";

const DEFAULT_GRANT_TYPE: &str = "client_credentials";
const DEFAULT_SCOPE: &str = "view_all_profiles";

/// Every outbound request is bounded by this call timeout; exceeding it is
/// a query failure, not a hang.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection and credential settings for the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the profile/agreement/bot-registry service.
    pub base_url: String,
    /// OAuth token endpoint URL.
    pub token_url: String,
    /// OAuth grant type; `client_credentials` unless overridden.
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
    /// OAuth scope requested with each token.
    pub scope: String,
    /// Per-call timeout applied to every outbound request.
    #[serde(skip, default = "default_timeout")]
    pub call_timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_CALL_TIMEOUT
}

impl ServiceConfig {
    pub fn new(base_url: &str, token_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Load configuration from environment variables, failing fast when a
    /// required value is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            std::env::var(ENV_BASE_URL).map_err(|_| ConfigError::MissingBaseUrl(ENV_BASE_URL))?;
        let token_url =
            std::env::var(ENV_TOKEN_URL).map_err(|_| ConfigError::MissingTokenUrl(ENV_TOKEN_URL))?;
        let client_id =
            std::env::var(ENV_CLIENT_ID).map_err(|_| ConfigError::MissingClientId(ENV_CLIENT_ID))?;
        let client_secret = std::env::var(ENV_CLIENT_SECRET)
            .map_err(|_| ConfigError::MissingClientSecret(ENV_CLIENT_SECRET))?;

        let mut config = Self::new(&base_url, &token_url, &client_id, &client_secret);
        if let Ok(grant_type) = std::env::var(ENV_GRANT_TYPE) {
            config.grant_type = grant_type;
        }
        if let Ok(scope) = std::env::var(ENV_SCOPE) {
            config.scope = scope;
        }
        Ok(config)
    }

    /// Override the requested OAuth scope.
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    /// Override the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}
