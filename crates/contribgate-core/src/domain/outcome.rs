//! Validation outcome and diagnostic trail.
//!
//! A [`ValidationOutcome`] is created fresh per commit, appended to by the
//! orchestrator as each check runs, and consumed once by the caller. The
//! trail preserves the fixed check order (committer → agreement → bot →
//! sign-off → delegation) regardless of how concurrently the underlying
//! queries resolved.

use serde::{Deserialize, Serialize};

/// The check that produced a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStep {
    CommitterCheck,
    AgreementCheck,
    BotExemptionCheck,
    SignOffCheck,
    DelegationCheck,
}

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

/// One entry in the ordered diagnostic trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The check this entry belongs to; `None` for preamble and framing lines.
    pub step: Option<ValidationStep>,
    pub text: String,
    pub severity: Severity,
}

/// The decision for a single commit: ordered diagnostics, blocking errors,
/// and the final pass/fail verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    messages: Vec<Diagnostic>,
    errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an informational entry with no owning check.
    pub fn push_note(&mut self, text: impl Into<String>) {
        self.messages.push(Diagnostic {
            step: None,
            text: text.into(),
            severity: Severity::Info,
        });
    }

    /// Append an informational entry for a check.
    pub fn push_info(&mut self, step: ValidationStep, text: impl Into<String>) {
        self.messages.push(Diagnostic {
            step: Some(step),
            text: text.into(),
            severity: Severity::Info,
        });
    }

    /// Append an error-severity entry for a check.
    pub fn push_error(&mut self, step: ValidationStep, text: impl Into<String>) {
        self.messages.push(Diagnostic {
            step: Some(step),
            text: text.into(),
            severity: Severity::Error,
        });
    }

    /// Record a blocking error. Any blocking error fails the commit.
    pub fn block(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// The ordered diagnostic trail.
    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    /// All blocking errors collected across the checks.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Whether the commit passed (no blocking errors were recorded).
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}
