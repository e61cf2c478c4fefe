//! Structured observability hooks for fix-workflow lifecycle events.
//!
//! This module provides:
//! - Error-scoped tracing spans via the `ErrorSpan` RAII guard
//! - Emission functions for key lifecycle events: error started, stage
//!   entered, error processed, batch finished
//!
//! Events are emitted at `info!` level. For JSON output, initialise the
//! subscriber with [`crate::telemetry::init_tracing`] in JSON mode.

use tracing::info;

/// RAII guard that enters an error-scoped tracing span for the duration
/// of one workflow run.
///
/// # Example
///
/// ```ignore
/// let _span = ErrorSpan::enter("err-12345");
/// // All tracing calls below carry error_id = "err-12345"
/// ```
pub struct ErrorSpan {
    _span: tracing::span::EnteredSpan,
}

impl ErrorSpan {
    /// Create and enter a span tagged with the audit error id.
    pub fn enter(error_id: &str) -> Self {
        let span = tracing::info_span!("fixflow.error", error_id = %error_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: workflow started for one audit error.
pub fn emit_error_started(error_id: &str, source: &str, severity: &str) {
    info!(event = "error.started", error_id = %error_id, source = %source, severity = %severity);
}

/// Emit event: workflow entered a stage.
pub fn emit_stage_entered(error_id: &str, stage: &str) {
    info!(event = "error.stage_entered", error_id = %error_id, stage = %stage);
}

/// Emit event: workflow finished for one audit error.
pub fn emit_error_processed(error_id: &str, success: bool, final_stage: &str) {
    info!(
        event = "error.processed",
        error_id = %error_id,
        success = success,
        final_stage = %final_stage,
    );
}

/// Emit event: a batch run finished.
pub fn emit_batch_finished(total: usize, succeeded: usize) {
    info!(
        event = "batch.finished",
        total = total,
        succeeded = succeeded,
        failed = total - succeeded,
    );
}
