//! Engine-level error taxonomy.

use fixflow_ports::PortError;

/// Errors produced while driving one error through the fix workflow.
///
/// Collaborator failures pass through as [`FixflowError::Port`]; the
/// remaining variants are decisions of this engine.
#[derive(Debug, thiserror::Error)]
pub enum FixflowError {
    /// No resolution heuristic produced a repository.
    #[error("no repository resolved for error {0}")]
    RepositoryNotFound(String),

    /// The fix agent completed but reported it could not produce a fix.
    #[error("fix agent reported failure: {0}")]
    FixAgentFailed(String),

    /// The bounded wait on the fix agent expired.
    #[error("fix agent run {run_id} did not complete within {waited_ms}ms")]
    FixAgentTimeout { run_id: String, waited_ms: u64 },

    /// A collaborator call failed.
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, FixflowError>;
