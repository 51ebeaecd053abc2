//! Contribgate Remote Service Layer
//!
//! Everything that talks to the profile/agreement service over HTTP: the
//! OAuth client-credentials token lifecycle, the bounded retry-on-401
//! request protocol, the concurrent candidate resolver, and the delegated
//! batch-validation client. The decision engine itself lives in
//! `contribgate-core` and only sees the trait seams implemented here.

pub mod api;
pub mod authenticator;
pub mod config;
pub mod delegated;
pub mod error;
pub mod resolver;
pub mod token;

pub use api::{AgreementStatus, BotRecord, BotServiceAccount, ProfileClient, ProfileService, UserProfile};

pub use authenticator::{AuthenticatedClient, BearerAuthenticator, MAX_AUTH_RESPONSES};

pub use config::{ServiceConfig, DEFAULT_CALL_TIMEOUT};

pub use delegated::{
    DelegatedValidator, ProviderType, RequestCommit, ValidationRequest, ValidationResponse,
};

pub use error::{ConfigError, TokenError};

pub use resolver::{any_match, RemoteDirectory};

pub use token::{AccessToken, OAuthTokenEndpoint, TokenFetcher, TokenManager, TokenStore};
