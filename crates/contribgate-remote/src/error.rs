//! Error types for the remote service layer.

/// Errors raised while obtaining an access token from the token endpoint.
///
/// The token manager never surfaces these to callers directly (a failed
/// refresh leaves the previously cached token untouched and reports
/// `None`), but the fetcher keeps the distinction for logging.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token endpoint transport failure: {0}")]
    Transport(String),

    #[error("token endpoint returned status {0}")]
    Status(u16),

    #[error("token response could not be decoded: {0}")]
    Decode(String),
}

/// Errors raised while loading or validating service configuration.
///
/// Configuration problems are fatal at startup; the gate fails fast rather
/// than silently degrading into "no agreement found" answers.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing client id (set {0})")]
    MissingClientId(&'static str),

    #[error("missing client secret (set {0})")]
    MissingClientSecret(&'static str),

    #[error("missing service base url (set {0})")]
    MissingBaseUrl(&'static str),

    #[error("missing token endpoint url (set {0})")]
    MissingTokenUrl(&'static str),
}
