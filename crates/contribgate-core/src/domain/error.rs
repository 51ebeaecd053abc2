//! Domain-level error taxonomy for contribgate.

/// Errors produced while resolving authorization state from the remote
/// profile service. These are infrastructure failures, never content
/// rejections: a commit that merely fails a check produces a failed
/// [`crate::ValidationOutcome`], not an error.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected status {status} from {operation}")]
    UnexpectedStatus { operation: String, status: u16 },

    #[error("response decoding failure from {operation}: {detail}")]
    Decode { operation: String, detail: String },

    #[error("authentication retries exhausted")]
    AuthExhausted,
}

impl ResolutionError {
    /// Whether this failure came from the retry-on-401 protocol giving up.
    pub fn is_auth_exhausted(&self) -> bool {
        matches!(self, ResolutionError::AuthExhausted)
    }
}

/// Contribgate validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The remote service could not be consulted. Callers must not report
    /// a missing agreement when the truth is that verification failed.
    #[error("could not verify contributor authorization: {0}")]
    Infrastructure(#[from] ResolutionError),
}

/// Result type for contribgate domain operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_display() {
        let err = ResolutionError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("transport failure"));

        let err = ResolutionError::UnexpectedStatus {
            operation: "profile-search".to_string(),
            status: 503,
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("profile-search"));
    }

    #[test]
    fn test_auth_exhausted_classification() {
        assert!(ResolutionError::AuthExhausted.is_auth_exhausted());
        assert!(!ResolutionError::Transport("x".to_string()).is_auth_exhausted());
    }

    #[test]
    fn test_infrastructure_error_wraps_resolution() {
        let err = ValidationError::from(ResolutionError::AuthExhausted);
        assert!(err
            .to_string()
            .contains("could not verify contributor authorization"));
    }
}
