//! Structured observability hooks for the validation lifecycle.
//!
//! This module provides:
//! - Commit-scoped tracing spans via the `ValidationSpan` RAII guard
//! - Emission functions for key lifecycle events: start, check result, finish
//!
//! Events are emitted at `info!` level. Infrastructure failures are emitted
//! at `warn!` so they are eligible for operator alerting, distinct from
//! routine content rejections.

use tracing::{info, warn};

use crate::domain::ValidationStep;

/// RAII guard that enters a commit-scoped tracing span for the duration of
/// one validation.
pub struct ValidationSpan {
    _span: tracing::span::EnteredSpan,
}

impl ValidationSpan {
    /// Create and enter a span tagged with the abbreviated commit hash.
    pub fn enter(commit: &str) -> Self {
        let span = tracing::info_span!("contribgate.validate", commit = %commit);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: validation started for a commit.
pub fn emit_validation_started(commit: &str, project: &str) {
    info!(event = "validation.started", commit = %commit, project = %project);
}

/// Emit event: a single check resolved.
pub fn emit_check_resolved(commit: &str, step: ValidationStep, satisfied: bool) {
    info!(event = "validation.check_resolved", commit = %commit, step = ?step, satisfied = satisfied);
}

/// Emit event: validation finished with the final verdict.
pub fn emit_validation_finished(commit: &str, passed: bool, error_count: usize) {
    info!(
        event = "validation.finished",
        commit = %commit,
        passed = passed,
        error_count = error_count,
    );
}

/// Emit event: the remote service could not be consulted (warning level).
pub fn emit_resolution_failed(commit: &str, step: ValidationStep, error: &dyn std::fmt::Display) {
    warn!(event = "validation.resolution_failed", commit = %commit, step = ?step, error = %error);
}
