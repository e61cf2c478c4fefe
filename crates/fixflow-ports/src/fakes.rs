//! In-memory fakes for the capability contracts (testing only)
//!
//! Provides `MemoryAuditStore`, `MemoryIssueTracker`, `MemorySourceHost`,
//! `MemoryChatNotifier`, and `MemoryFixAgent` that satisfy the trait
//! contracts without any external dependencies. The source host counts
//! lookup and search calls so resolver-precedence tests can assert which
//! heuristics were consulted.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::agent::{FixOutcome, FixRunState, FixRunStatus, FixTask, ModifiedFile};
use crate::audit::{AuditError, AuditFilter, FixInfo, Severity};
use crate::contracts::{AuditStore, ChatNotifier, FixAgent, IssueTracker, SourceHost};
use crate::error::{PortError, PortResult};
use crate::notify::ChannelMessage;
use crate::repo::{RepositoryDescriptor, RepositorySearchHit};
use crate::ticket::{BugDraft, FileChange, PullRequestDraft, PullRequestInfo, WorkItem};

// ---------------------------------------------------------------------------
// MemoryAuditStore
// ---------------------------------------------------------------------------

/// In-memory audit store backed by a `BTreeMap<id, AuditError>`.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    errors: Mutex<BTreeMap<String, AuditError>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any existing one with the same id.
    pub fn seed(&self, error: AuditError) {
        let mut errors = self.errors.lock().unwrap();
        errors.insert(error.id.clone(), error);
    }

    /// Snapshot a record for assertions.
    pub fn record(&self, id: &str) -> Option<AuditError> {
        self.errors.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn fetch_unprocessed(&self, filter: &AuditFilter) -> PortResult<Vec<AuditError>> {
        let errors = self.errors.lock().unwrap();
        let mut matched: Vec<AuditError> = errors
            .values()
            .filter(|e| !e.processed)
            .filter(|e| {
                filter
                    .severities
                    .as_ref()
                    .map(|set| set.contains(&e.severity))
                    .unwrap_or(true)
            })
            .filter(|e| filter.source.as_ref().map(|s| *s == e.source).unwrap_or(true))
            .filter(|e| filter.since.map(|t| e.timestamp >= t).unwrap_or(true))
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.timestamp);
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn get_error(&self, id: &str) -> PortResult<Option<AuditError>> {
        Ok(self.errors.lock().unwrap().get(id).cloned())
    }

    async fn mark_processed(
        &self,
        id: &str,
        metadata: Option<BTreeMap<String, String>>,
    ) -> PortResult<()> {
        let mut errors = self.errors.lock().unwrap();
        let record = errors
            .get_mut(id)
            .ok_or_else(|| PortError::ErrorNotFound(id.to_string()))?;
        record.processed = true;
        if let Some(metadata) = metadata {
            record.metadata.extend(metadata);
        }
        Ok(())
    }

    async fn update_fix_info(&self, id: &str, fix: FixInfo) -> PortResult<()> {
        let mut errors = self.errors.lock().unwrap();
        let record = errors
            .get_mut(id)
            .ok_or_else(|| PortError::ErrorNotFound(id.to_string()))?;
        record.fix_info = Some(fix);
        Ok(())
    }

    async fn counts_by_severity(&self) -> PortResult<BTreeMap<Severity, u64>> {
        let errors = self.errors.lock().unwrap();
        let mut counts = BTreeMap::new();
        for error in errors.values() {
            *counts.entry(error.severity).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn counts_by_source(&self) -> PortResult<BTreeMap<String, u64>> {
        let errors = self.errors.lock().unwrap();
        let mut counts = BTreeMap::new();
        for error in errors.values() {
            *counts.entry(error.source.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

// ---------------------------------------------------------------------------
// MemoryIssueTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TrackerState {
    next_id: u64,
    items: BTreeMap<u64, WorkItem>,
    drafts: Vec<BugDraft>,
    comments: Vec<(u64, String)>,
    links: Vec<(u64, String)>,
}

/// In-memory issue tracker with sequential work-item ids starting at 1000.
#[derive(Debug, Default)]
pub struct MemoryIssueTracker {
    state: Mutex<TrackerState>,
}

impl MemoryIssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_drafts(&self) -> Vec<BugDraft> {
        self.state.lock().unwrap().drafts.clone()
    }

    pub fn comments_for(&self, id: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|(item, _)| *item == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn links_for(&self, id: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .links
            .iter()
            .filter(|(item, _)| *item == id)
            .map(|(_, url)| url.clone())
            .collect()
    }
}

#[async_trait]
impl IssueTracker for MemoryIssueTracker {
    async fn create_bug(&self, draft: BugDraft) -> PortResult<WorkItem> {
        let mut state = self.state.lock().unwrap();
        let id = 1000 + state.next_id;
        state.next_id += 1;
        let item = WorkItem {
            id,
            title: draft.title.clone(),
            state: "New".to_string(),
            url: Some(format!("https://tracker.fixflow.dev/items/{id}")),
        };
        state.items.insert(id, item.clone());
        state.drafts.push(draft);
        Ok(item)
    }

    async fn update_fields(&self, id: u64, fields: BTreeMap<String, String>) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .items
            .get_mut(&id)
            .ok_or(PortError::WorkItemNotFound(id))?;
        if let Some(title) = fields.get("title") {
            item.title = title.clone();
        }
        if let Some(item_state) = fields.get("state") {
            item.state = item_state.clone();
        }
        Ok(())
    }

    async fn add_comment(&self, id: u64, text: &str) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.items.contains_key(&id) {
            return Err(PortError::WorkItemNotFound(id));
        }
        state.comments.push((id, text.to_string()));
        Ok(())
    }

    async fn link_pull_request(&self, id: u64, pr_url: &str) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.items.contains_key(&id) {
            return Err(PortError::WorkItemNotFound(id));
        }
        state.links.push((id, pr_url.to_string()));
        Ok(())
    }

    async fn get_work_item(&self, id: u64) -> PortResult<Option<WorkItem>> {
        Ok(self.state.lock().unwrap().items.get(&id).cloned())
    }

    async fn close(&self, id: u64, reason: &str) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .items
            .get_mut(&id)
            .ok_or(PortError::WorkItemNotFound(id))?;
        item.state = "Closed".to_string();
        state.comments.push((id, format!("closed: {reason}")));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySourceHost
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRecord {
    pub repository: String,
    pub branch: String,
    pub from_branch: String,
}

#[derive(Debug, Default)]
struct HostState {
    repos: BTreeMap<String, RepositoryDescriptor>,
    search_results: Vec<RepositorySearchHit>,
    branches: Vec<BranchRecord>,
    prs: Vec<PullRequestDraft>,
    files: BTreeMap<(String, String, String), String>,
    commit_seq: u64,
}

/// In-memory source host with lookup/search call counters.
#[derive(Debug, Default)]
pub struct MemorySourceHost {
    state: Mutex<HostState>,
    lookup_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl MemorySourceHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository so direct lookups succeed.
    pub fn with_repository(self, repo: RepositoryDescriptor) -> Self {
        self.state
            .lock()
            .unwrap()
            .repos
            .insert(repo.full_name.clone(), repo);
        self
    }

    /// Fix the result list returned by every search call.
    pub fn set_search_results(&self, hits: Vec<RepositorySearchHit>) {
        self.state.lock().unwrap().search_results = hits;
    }

    /// Store file contents so `read_file` succeeds.
    pub fn put_file(&self, full_name: &str, reference: &str, path: &str, content: &str) {
        self.state.lock().unwrap().files.insert(
            (
                full_name.to_string(),
                reference.to_string(),
                path.to_string(),
            ),
            content.to_string(),
        );
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn created_branches(&self) -> Vec<BranchRecord> {
        self.state.lock().unwrap().branches.clone()
    }

    pub fn created_prs(&self) -> Vec<PullRequestDraft> {
        self.state.lock().unwrap().prs.clone()
    }
}

#[async_trait]
impl SourceHost for MemorySourceHost {
    async fn get_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> PortResult<Option<RepositoryDescriptor>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state.repos.get(&format!("{owner}/{name}")).cloned())
    }

    async fn search_repositories(&self, _query: &str) -> PortResult<Vec<RepositorySearchHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().search_results.clone())
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from_branch: &str,
    ) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let full_name = format!("{owner}/{repo}");
        if !state.repos.contains_key(&full_name) {
            return Err(PortError::RepositoryNotFound(full_name));
        }
        state.branches.push(BranchRecord {
            repository: full_name,
            branch: branch.to_string(),
            from_branch: from_branch.to_string(),
        });
        Ok(())
    }

    async fn push_files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        changes: &[FileChange],
        _message: &str,
    ) -> PortResult<String> {
        let mut state = self.state.lock().unwrap();
        let full_name = format!("{owner}/{repo}");
        if !state.repos.contains_key(&full_name) {
            return Err(PortError::RepositoryNotFound(full_name));
        }
        for change in changes {
            state.files.insert(
                (full_name.clone(), branch.to_string(), change.path.clone()),
                change.content.clone(),
            );
        }
        state.commit_seq += 1;
        Ok(format!("commit-{:08}", state.commit_seq))
    }

    async fn create_pull_request(&self, draft: PullRequestDraft) -> PortResult<PullRequestInfo> {
        let mut state = self.state.lock().unwrap();
        let full_name = format!("{}/{}", draft.owner, draft.repo);
        if !state.repos.contains_key(&full_name) {
            return Err(PortError::RepositoryNotFound(full_name.clone()));
        }
        state.prs.push(draft);
        let number = state.prs.len() as u64;
        Ok(PullRequestInfo {
            url: format!("https://github.com/{full_name}/pull/{number}"),
            number,
        })
    }

    async fn read_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: &str,
    ) -> PortResult<String> {
        let state = self.state.lock().unwrap();
        let key = (
            format!("{owner}/{repo}"),
            reference.to_string(),
            path.to_string(),
        );
        state
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| PortError::Api(format!("file not found: {path} at {reference}")))
    }

    async fn latest_commit(&self, owner: &str, repo: &str, branch: &str) -> PortResult<String> {
        let state = self.state.lock().unwrap();
        let full_name = format!("{owner}/{repo}");
        if !state.repos.contains_key(&full_name) {
            return Err(PortError::RepositoryNotFound(full_name));
        }
        Ok(format!("head-{branch}-{:08}", state.commit_seq))
    }
}

// ---------------------------------------------------------------------------
// MemoryChatNotifier
// ---------------------------------------------------------------------------

/// In-memory notifier that records sent messages; can be switched into a
/// failing mode to exercise best-effort notification paths.
#[derive(Debug, Default)]
pub struct MemoryChatNotifier {
    sent: Mutex<Vec<ChannelMessage>>,
    failing: Mutex<bool>,
}

impl MemoryChatNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with a network error.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<ChannelMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatNotifier for MemoryChatNotifier {
    async fn send(&self, message: ChannelMessage) -> PortResult<()> {
        if *self.failing.lock().unwrap() {
            return Err(PortError::Network("webhook unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryFixAgent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum AgentScript {
    Succeed {
        summary: String,
        modified_files: Vec<ModifiedFile>,
    },
    ReportFailure {
        error: String,
    },
    NeverComplete,
}

#[derive(Debug, Default)]
struct AgentState {
    submitted: Vec<FixTask>,
    runs: BTreeMap<String, FixRunState>,
    cancelled: Vec<String>,
}

/// Scriptable in-memory fix agent.
///
/// Defaults to succeeding with a generic summary; `report_failure` and
/// `never_complete` switch the next wait into agent-reported failure or
/// timeout behaviour.
#[derive(Debug)]
pub struct MemoryFixAgent {
    script: Mutex<AgentScript>,
    state: Mutex<AgentState>,
}

impl Default for MemoryFixAgent {
    fn default() -> Self {
        Self {
            script: Mutex::new(AgentScript::Succeed {
                summary: "applied automated fix".to_string(),
                modified_files: Vec::new(),
            }),
            state: Mutex::new(AgentState::default()),
        }
    }
}

impl MemoryFixAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed_with(&self, summary: &str, modified_files: Vec<ModifiedFile>) {
        *self.script.lock().unwrap() = AgentScript::Succeed {
            summary: summary.to_string(),
            modified_files,
        };
    }

    /// Agent completes but reports it could not produce a fix.
    pub fn report_failure(&self, error: &str) {
        *self.script.lock().unwrap() = AgentScript::ReportFailure {
            error: error.to_string(),
        };
    }

    /// Run never finishes; waits expire with a timeout.
    pub fn never_complete(&self) {
        *self.script.lock().unwrap() = AgentScript::NeverComplete;
    }

    pub fn submitted_tasks(&self) -> Vec<FixTask> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn cancelled_runs(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

#[async_trait]
impl FixAgent for MemoryFixAgent {
    async fn submit(&self, task: FixTask) -> PortResult<String> {
        let run_id = Uuid::new_v4().to_string();
        let mut state = self.state.lock().unwrap();
        state.submitted.push(task);
        state.runs.insert(run_id.clone(), FixRunState::Running);
        Ok(run_id)
    }

    async fn status(&self, run_id: &str) -> PortResult<FixRunStatus> {
        let state = self.state.lock().unwrap();
        let run_state = state
            .runs
            .get(run_id)
            .copied()
            .ok_or_else(|| PortError::RunNotFound(run_id.to_string()))?;
        Ok(FixRunStatus {
            run_id: run_id.to_string(),
            state: run_state,
            detail: None,
        })
    }

    async fn wait_for_completion(
        &self,
        run_id: &str,
        timeout: Duration,
    ) -> PortResult<FixOutcome> {
        let script = self.script.lock().unwrap().clone();
        let mut state = self.state.lock().unwrap();
        if !state.runs.contains_key(run_id) {
            return Err(PortError::RunNotFound(run_id.to_string()));
        }
        match script {
            AgentScript::Succeed {
                summary,
                modified_files,
            } => {
                state.runs.insert(run_id.to_string(), FixRunState::Completed);
                Ok(FixOutcome {
                    run_id: run_id.to_string(),
                    success: true,
                    summary,
                    modified_files,
                    error: None,
                })
            }
            AgentScript::ReportFailure { error } => {
                state.runs.insert(run_id.to_string(), FixRunState::Failed);
                Ok(FixOutcome {
                    run_id: run_id.to_string(),
                    success: false,
                    summary: String::new(),
                    modified_files: Vec::new(),
                    error: Some(error),
                })
            }
            AgentScript::NeverComplete => Err(PortError::Timeout {
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn cancel(&self, run_id: &str) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.runs.contains_key(run_id) {
            return Err(PortError::RunNotFound(run_id.to_string()));
        }
        state.runs.insert(run_id.to_string(), FixRunState::Cancelled);
        state.cancelled.push(run_id.to_string());
        Ok(())
    }
}

/// Convenience for tests: a fix info snapshot stamped now.
pub fn fix_info_now(
    work_item_id: Option<u64>,
    pr_url: Option<String>,
    branch: Option<String>,
    agent_run_id: Option<String>,
) -> FixInfo {
    FixInfo {
        work_item_id,
        pr_url,
        branch,
        agent_run_id,
        fixed_at: Utc::now(),
    }
}
