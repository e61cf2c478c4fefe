//! Failure taxonomy for external collaborator calls.

use thiserror::Error;

/// Errors surfaced by the collaborator contracts.
///
/// "Not found" lookup outcomes are modelled as `Ok(None)` by the individual
/// contract methods; the `*NotFound` variants here cover integrity failures
/// where a referenced record is required to exist (e.g. marking an unknown
/// audit error as processed).
#[derive(Error, Debug)]
pub enum PortError {
    /// Remote API rejected the call
    #[error("API call failed: {0}")]
    Api(String),

    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Audit error record not found
    #[error("audit error not found: {0}")]
    ErrorNotFound(String),

    /// Work item not found
    #[error("work item not found: {0}")]
    WorkItemNotFound(u64),

    /// Repository not found where one was required
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    /// Fix agent run not found
    #[error("fix agent run not found: {0}")]
    RunNotFound(String),

    /// Bounded wait on a fix agent run expired
    #[error("timed out after {waited_ms}ms waiting for completion")]
    Timeout { waited_ms: u64 },

    /// Payload (de)serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PortError {
    fn from(err: serde_json::Error) -> Self {
        PortError::Serialization(err.to_string())
    }
}

/// Result type for collaborator operations.
pub type PortResult<T> = std::result::Result<T, PortError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_display() {
        let err = PortError::Api("403 forbidden".to_string());
        assert!(err.to_string().contains("API call failed"));

        let err = PortError::ErrorNotFound("err-42".to_string());
        assert!(err.to_string().contains("err-42"));

        let err = PortError::Timeout { waited_ms: 1500 };
        assert!(err.to_string().contains("1500ms"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PortError = parse_err.into();
        assert!(matches!(err, PortError::Serialization(_)));
    }
}
