//! Domain models for contribgate.
//!
//! Canonical definitions for the core entities:
//! - `Identity`: Resolved commit author or pusher identity
//! - `CommitSubmission`: Host-extracted commit metadata
//! - `ValidationOutcome`: Ordered diagnostic trail plus pass/fail verdict
//! - `ResolutionError` / `ValidationError`: Infrastructure failure taxonomy

pub mod commit;
pub mod error;
pub mod identity;
pub mod outcome;

// Re-export main types and errors
pub use commit::{CommitSubmission, GitPerson};
pub use error::{ResolutionError, Result, ValidationError};
pub use identity::Identity;
pub use outcome::{Diagnostic, Severity, ValidationOutcome, ValidationStep};
