//! Workflow stage tracking.
//!
//! [`WorkflowStatus`] is an immutable value: every transition returns a new
//! status, so stage progressions are testable via equality and no shared
//! mutable state exists between steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stages of the fix workflow, in intended progression order. Any
/// non-terminal stage may transition directly to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Initializing,
    ParsingError,
    FindingRepository,
    CreatingWorkItem,
    CreatingBranch,
    RunningFixAgent,
    CreatingPullRequest,
    NotifyingTeam,
    Completed,
    Failed,
}

impl WorkflowStage {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::Initializing => "initializing",
            WorkflowStage::ParsingError => "parsing_error",
            WorkflowStage::FindingRepository => "finding_repository",
            WorkflowStage::CreatingWorkItem => "creating_work_item",
            WorkflowStage::CreatingBranch => "creating_branch",
            WorkflowStage::RunningFixAgent => "running_fix_agent",
            WorkflowStage::CreatingPullRequest => "creating_pull_request",
            WorkflowStage::NotifyingTeam => "notifying_team",
            WorkflowStage::Completed => "completed",
            WorkflowStage::Failed => "failed",
        }
    }

    /// Progress when entering this stage. Failed runs keep the progress
    /// they had reached, so `Failed` carries no value of its own.
    fn entry_progress(self) -> u8 {
        match self {
            WorkflowStage::Initializing => 0,
            WorkflowStage::ParsingError => 10,
            WorkflowStage::FindingRepository => 20,
            WorkflowStage::CreatingWorkItem => 35,
            WorkflowStage::CreatingBranch => 50,
            WorkflowStage::RunningFixAgent => 70,
            WorkflowStage::CreatingPullRequest => 85,
            WorkflowStage::NotifyingTeam => 95,
            WorkflowStage::Completed | WorkflowStage::Failed => 100,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStage::Completed | WorkflowStage::Failed)
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one workflow run's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub stage: WorkflowStage,

    /// 0..=100, monotonically non-decreasing within one run.
    pub progress: u8,

    pub message: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl WorkflowStatus {
    /// Fresh status at workflow start.
    pub fn start() -> Self {
        Self {
            stage: WorkflowStage::Initializing,
            progress: 0,
            message: "initializing".to_string(),
            started_at: Utc::now(),
            ended_at: None,
            error: None,
        }
    }

    /// Enter a new stage. Progress never decreases.
    pub fn advance(&self, stage: WorkflowStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: self.progress.max(stage.entry_progress()),
            message: message.into(),
            started_at: self.started_at,
            ended_at: None,
            error: None,
        }
    }

    /// Terminal success.
    pub fn complete(&self, message: impl Into<String>) -> Self {
        Self {
            stage: WorkflowStage::Completed,
            progress: 100,
            message: message.into(),
            started_at: self.started_at,
            ended_at: Some(Utc::now()),
            error: None,
        }
    }

    /// Terminal failure, recording the stage that was executing.
    pub fn fail(&self, error: impl Into<String>) -> Self {
        Self {
            stage: WorkflowStage::Failed,
            progress: self.progress,
            message: format!("failed during {}", self.stage),
            started_at: self.started_at,
            ended_at: Some(Utc::now()),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic_across_stages() {
        let mut status = WorkflowStatus::start();
        let stages = [
            WorkflowStage::ParsingError,
            WorkflowStage::FindingRepository,
            WorkflowStage::CreatingWorkItem,
            WorkflowStage::CreatingBranch,
            WorkflowStage::RunningFixAgent,
            WorkflowStage::CreatingPullRequest,
            WorkflowStage::NotifyingTeam,
        ];
        let mut last = status.progress;
        for stage in stages {
            status = status.advance(stage, stage.as_str());
            assert!(status.progress >= last, "progress decreased at {stage}");
            last = status.progress;
        }
        let done = status.complete("fix delivered");
        assert_eq!(done.progress, 100);
        assert_eq!(done.stage, WorkflowStage::Completed);
        assert!(done.ended_at.is_some());
    }

    #[test]
    fn test_fail_freezes_progress_and_records_stage() {
        let status = WorkflowStatus::start()
            .advance(WorkflowStage::ParsingError, "parsing")
            .advance(WorkflowStage::FindingRepository, "resolving");
        let failed = status.fail("no repository resolved for error err-1");

        assert_eq!(failed.stage, WorkflowStage::Failed);
        assert_eq!(failed.progress, status.progress);
        assert_eq!(failed.message, "failed during finding_repository");
        assert!(failed.error.as_deref().unwrap().contains("err-1"));
        assert!(failed.ended_at.is_some());
    }

    #[test]
    fn test_advance_returns_new_value() {
        let start = WorkflowStatus::start();
        let next = start.advance(WorkflowStage::ParsingError, "parsing");
        assert_eq!(start.stage, WorkflowStage::Initializing);
        assert_ne!(start, next);
        assert_eq!(next.started_at, start.started_at);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(WorkflowStage::Completed.is_terminal());
        assert!(WorkflowStage::Failed.is_terminal());
        assert!(!WorkflowStage::NotifyingTeam.is_terminal());
    }
}
