//! Contribgate Core Library
//!
//! The authorization decision engine for incoming commits: domain model,
//! validation orchestrator, sign-off trailer parsing, and the trait seams
//! behind which either a per-check remote resolver or a delegated batch
//! validator can sit (see `contribgate-remote`).

pub mod directory;
pub mod domain;
pub mod obs;
pub mod telemetry;
pub mod trailer;
pub mod validator;

pub use directory::{AccountDirectory, AuthoritySource, CommitterRegistry, LocalAccount};

pub use domain::{
    CommitSubmission, Diagnostic, GitPerson, Identity, ResolutionError, Result, Severity,
    ValidationError, ValidationOutcome, ValidationStep,
};

pub use telemetry::init_tracing;

pub use trailer::sign_off_emails;

pub use validator::CommitValidator;
