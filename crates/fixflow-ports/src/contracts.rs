//! The five external capability contracts consumed by the decision engine.
//!
//! - `AuditStore`: fetch/mark-processed on the audit-log data store
//! - `IssueTracker`: bug work-item lifecycle
//! - `SourceHost`: branches, commits, pull requests, repository lookup/search
//! - `ChatNotifier`: team channel messages
//! - `FixAgent`: automated fix task submission and polling
//!
//! All traits are async and transport-agnostic. In-memory fakes satisfying
//! every contract live in the `fakes` module.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::{FixOutcome, FixRunStatus, FixTask};
use crate::audit::{AuditError, AuditFilter, FixInfo, Severity};
use crate::error::PortResult;
use crate::notify::{ChannelMessage, Importance};
use crate::repo::{RepositoryDescriptor, RepositorySearchHit};
use crate::ticket::{BugDraft, FileChange, PullRequestDraft, PullRequestInfo, WorkItem};

// ---------------------------------------------------------------------------
// AuditStore
// ---------------------------------------------------------------------------

/// Audit-log data store holding raw error records.
///
/// Guarantees:
/// - `mark_processed` merges metadata keys into the record (existing keys
///   are overwritten) and sets the processed flag; it is the durability
///   boundary for at-most-once reprocessing across restarts.
/// - Records are never deleted through this contract.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Fetch unprocessed errors matching the filter, oldest first.
    async fn fetch_unprocessed(&self, filter: &AuditFilter) -> PortResult<Vec<AuditError>>;

    /// Fetch one error by id. `Ok(None)` when absent.
    async fn get_error(&self, id: &str) -> PortResult<Option<AuditError>>;

    /// Set the processed flag, merging optional metadata into the record.
    async fn mark_processed(
        &self,
        id: &str,
        metadata: Option<BTreeMap<String, String>>,
    ) -> PortResult<()>;

    /// Persist fix bookkeeping onto the record's dedicated fix-info fields.
    async fn update_fix_info(&self, id: &str, fix: FixInfo) -> PortResult<()>;

    /// Aggregate count of all records by severity.
    async fn counts_by_severity(&self) -> PortResult<BTreeMap<Severity, u64>>;

    /// Aggregate count of all records by emitting service.
    async fn counts_by_source(&self) -> PortResult<BTreeMap<String, u64>>;
}

// ---------------------------------------------------------------------------
// IssueTracker
// ---------------------------------------------------------------------------

/// Issue tracker holding bug work items.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create a bug work item and return it with its assigned id.
    async fn create_bug(&self, draft: BugDraft) -> PortResult<WorkItem>;

    /// Update arbitrary fields on a work item.
    async fn update_fields(&self, id: u64, fields: BTreeMap<String, String>) -> PortResult<()>;

    /// Append a comment to a work item.
    async fn add_comment(&self, id: u64, text: &str) -> PortResult<()>;

    /// Link a pull request URL to a work item.
    async fn link_pull_request(&self, id: u64, pr_url: &str) -> PortResult<()>;

    /// Fetch a work item by id. `Ok(None)` when absent.
    async fn get_work_item(&self, id: u64) -> PortResult<Option<WorkItem>>;

    /// Close a work item with a reason.
    async fn close(&self, id: u64, reason: &str) -> PortResult<()>;
}

// ---------------------------------------------------------------------------
// SourceHost
// ---------------------------------------------------------------------------

/// Source-control host (repositories, branches, commits, pull requests).
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Fetch repository metadata. `Ok(None)` when the repository does not exist.
    async fn get_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> PortResult<Option<RepositoryDescriptor>>;

    /// Fuzzy-search repositories by free-text query, best match first.
    async fn search_repositories(&self, query: &str) -> PortResult<Vec<RepositorySearchHit>>;

    /// Create `branch` from the head of `from_branch`.
    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from_branch: &str,
    ) -> PortResult<()>;

    /// Commit files to a branch, returning the new commit identifier.
    async fn push_files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        changes: &[FileChange],
        message: &str,
    ) -> PortResult<String>;

    /// Open a pull request.
    async fn create_pull_request(&self, draft: PullRequestDraft) -> PortResult<PullRequestInfo>;

    /// Read a file's contents at a ref (branch, tag, or commit).
    async fn read_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: &str,
    ) -> PortResult<String>;

    /// Latest commit identifier on a branch.
    async fn latest_commit(&self, owner: &str, repo: &str, branch: &str) -> PortResult<String>;
}

// ---------------------------------------------------------------------------
// ChatNotifier
// ---------------------------------------------------------------------------

/// Team chat channel notifier.
///
/// The convenience operations are derived from [`ChatNotifier::send`]; fakes
/// and adapters only have to implement the generic send.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Send a formatted message to the team channel.
    async fn send(&self, message: ChannelMessage) -> PortResult<()>;

    /// Announce a created fix pull request.
    async fn notify_pr_created(
        &self,
        repository: &str,
        work_item_id: u64,
        summary: &str,
        pr_url: &str,
    ) -> PortResult<()> {
        self.send(ChannelMessage::new(
            format!("Automated fix ready for {repository}"),
            format!("Work item #{work_item_id}: {summary}\n{pr_url}"),
            Importance::Info,
        ))
        .await
    }

    /// Announce a failed processing attempt.
    async fn notify_processing_error(
        &self,
        error_id: &str,
        stage: &str,
        detail: &str,
    ) -> PortResult<()> {
        self.send(ChannelMessage::new(
            format!("Fix workflow failed for error {error_id}"),
            format!("Stage: {stage}\n{detail}"),
            Importance::Warning,
        ))
        .await
    }
}

// ---------------------------------------------------------------------------
// FixAgent
// ---------------------------------------------------------------------------

/// Automated code-fixing service.
#[async_trait]
pub trait FixAgent: Send + Sync {
    /// Submit a fix task; returns the agent run id.
    async fn submit(&self, task: FixTask) -> PortResult<String>;

    /// Poll the state of a run.
    async fn status(&self, run_id: &str) -> PortResult<FixRunStatus>;

    /// Block until the run reaches a terminal state, bounded by `timeout`.
    /// Returns `PortError::Timeout` when the bound expires first.
    async fn wait_for_completion(&self, run_id: &str, timeout: Duration)
        -> PortResult<FixOutcome>;

    /// Cancel an in-flight run.
    async fn cancel(&self, run_id: &str) -> PortResult<()>;
}
