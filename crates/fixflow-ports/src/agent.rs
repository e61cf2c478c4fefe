//! Fix-agent task and run records.

use serde::{Deserialize, Serialize};

use crate::trace::ParsedStackTrace;

/// A fix task submitted to the automated-fix agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixTask {
    pub error_message: String,
    pub stack_trace: ParsedStackTrace,

    /// Target repository full name ("owner/name").
    pub repository: String,

    /// Branch the agent works on.
    pub branch: String,

    /// Free-text context for the agent prompt.
    pub context: String,

    /// Work item the fix is tracked under, if one exists yet.
    pub work_item_id: Option<u64>,

    /// Opaque execution-environment identifier, agent-specific.
    pub environment_id: Option<String>,
}

/// Lifecycle state of a fix-agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixRunState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl FixRunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FixRunState::Completed | FixRunState::Failed | FixRunState::Cancelled
        )
    }
}

/// Poll snapshot of a fix-agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRunStatus {
    pub run_id: String,
    pub state: FixRunState,
    pub detail: Option<String>,
}

/// One file the agent touched while producing the fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedFile {
    pub path: String,

    /// What happened to the file ("modified", "created", "deleted").
    pub change: String,
}

/// Final report from a completed fix-agent run.
///
/// `success = false` means the agent finished but could not produce a fix;
/// that is distinct from transport/timeout failures, which surface as
/// `PortError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOutcome {
    pub run_id: String,
    pub success: bool,
    pub summary: String,
    pub modified_files: Vec<ModifiedFile>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_run_state_terminal() {
        assert!(!FixRunState::Pending.is_terminal());
        assert!(!FixRunState::Running.is_terminal());
        assert!(FixRunState::Completed.is_terminal());
        assert!(FixRunState::Failed.is_terminal());
        assert!(FixRunState::Cancelled.is_terminal());
    }

    #[test]
    fn test_fix_outcome_serde_roundtrip() {
        let outcome = FixOutcome {
            run_id: "run-1".to_string(),
            success: true,
            summary: "guarded the undefined access".to_string(),
            modified_files: vec![ModifiedFile {
                path: "src/app.ts".to_string(),
                change: "modified".to_string(),
            }],
            error: None,
        };
        let json = serde_json::to_string(&outcome).expect("serialize");
        let back: FixOutcome = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(outcome, back);
    }
}
