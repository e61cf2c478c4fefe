//! The fix workflow: one audit error in, one [`FixResult`] out.
//!
//! `process_error` never returns `Err`. Every failure inside a run is
//! converted into a failed [`FixResult`] naming the stage it died in, so
//! a batch can keep going when one error blows up. Side effects already
//! performed before a failure (a created work item, a pushed branch) are
//! deliberately left in place and reported in the result.

mod status;
mod ticket;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fixflow_ports::{
    AuditError, AuditFilter, AuditStore, ChatNotifier, FixAgent, FixInfo, FixTask, IssueTracker,
    ModifiedFile, PortError, PullRequestDraft, RepositoryDescriptor, SourceHost,
};

use crate::config::WorkflowConfig;
use crate::error::{FixflowError, Result};
use crate::obs;
use crate::resolver::RepositoryResolver;
use crate::stack_trace;

pub use status::{WorkflowStage, WorkflowStatus};

/// Branch the fix agent works on for a given audit error. Deterministic,
/// so a re-run of the same error targets the same branch.
pub fn branch_name(error_id: &str) -> String {
    format!("bug/auto-fix-{error_id}")
}

/// Outcome of processing one audit error.
///
/// `success = false` results still carry whatever was created before the
/// failing stage (work item id, branch, agent run id), so operators can
/// find and clean up partial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixResult {
    pub error_id: String,
    pub success: bool,

    /// Resolved repository full name, when resolution got that far.
    pub repository: Option<String>,

    pub work_item_id: Option<u64>,
    pub branch: Option<String>,
    pub agent_run_id: Option<String>,
    pub pr_url: Option<String>,
    pub pr_number: Option<u64>,

    /// Agent's own summary of the fix (empty on failure).
    pub summary: String,
    pub modified_files: Vec<ModifiedFile>,

    /// Failure detail, including the stage that failed.
    pub error: Option<String>,

    pub completed_at: DateTime<Utc>,
}

/// Partial state accumulated while a run advances, kept outside the happy
/// path's return value so a failed run can still report it.
struct RunContext {
    status: WorkflowStatus,
    repository: Option<RepositoryDescriptor>,
    work_item_id: Option<u64>,
    branch: Option<String>,
    agent_run_id: Option<String>,
}

impl RunContext {
    fn new() -> Self {
        Self {
            status: WorkflowStatus::start(),
            repository: None,
            work_item_id: None,
            branch: None,
            agent_run_id: None,
        }
    }

    fn enter(&mut self, error_id: &str, stage: WorkflowStage, message: &str) {
        self.status = self.status.advance(stage, message);
        obs::emit_stage_entered(error_id, stage.as_str());
    }
}

/// Orchestrates the ticket → branch → fix agent → pull request → notify
/// pipeline over the five external contracts.
pub struct FixWorkflow {
    audit: Arc<dyn AuditStore>,
    tracker: Arc<dyn IssueTracker>,
    host: Arc<dyn SourceHost>,
    notifier: Arc<dyn ChatNotifier>,
    agent: Arc<dyn FixAgent>,
    resolver: RepositoryResolver,
    config: WorkflowConfig,
}

impl FixWorkflow {
    pub fn new(
        audit: Arc<dyn AuditStore>,
        tracker: Arc<dyn IssueTracker>,
        host: Arc<dyn SourceHost>,
        notifier: Arc<dyn ChatNotifier>,
        agent: Arc<dyn FixAgent>,
        config: WorkflowConfig,
    ) -> Self {
        let resolver =
            RepositoryResolver::new(Arc::clone(&host), config.source_repositories.clone());
        Self {
            audit,
            tracker,
            host,
            notifier,
            agent,
            resolver,
            config,
        }
    }

    /// Process one audit error end to end. Infallible by contract: any
    /// stage failure becomes a failed [`FixResult`], and the team is
    /// notified best-effort.
    pub async fn process_error(&self, error: &AuditError) -> FixResult {
        let _span = obs::ErrorSpan::enter(&error.id);
        obs::emit_error_started(&error.id, &error.source, error.severity.label());

        let mut ctx = RunContext::new();
        match self.attempt(error, &mut ctx).await {
            Ok(result) => {
                obs::emit_error_processed(&error.id, true, WorkflowStage::Completed.as_str());
                result
            }
            Err(err) => {
                let failed_stage = ctx.status.stage;
                ctx.status = ctx.status.fail(err.to_string());
                warn!(
                    event = "error.stage_failed",
                    error_id = %error.id,
                    stage = failed_stage.as_str(),
                    error = %err,
                );

                // Best-effort: a broken notifier must not mask the real failure.
                if let Err(notify_err) = self
                    .notifier
                    .notify_processing_error(&error.id, failed_stage.as_str(), &err.to_string())
                    .await
                {
                    warn!(
                        event = "error.notify_failed",
                        error_id = %error.id,
                        error = %notify_err,
                    );
                }

                obs::emit_error_processed(&error.id, false, failed_stage.as_str());
                FixResult {
                    error_id: error.id.clone(),
                    success: false,
                    repository: ctx.repository.map(|r| r.full_name),
                    work_item_id: ctx.work_item_id,
                    branch: ctx.branch,
                    agent_run_id: ctx.agent_run_id,
                    pr_url: None,
                    pr_number: None,
                    summary: String::new(),
                    modified_files: Vec::new(),
                    error: Some(format!("{err} (stage: {failed_stage})")),
                    completed_at: Utc::now(),
                }
            }
        }
    }

    /// Fetch unprocessed errors matching the filter and process them
    /// sequentially. One error's failure never stops the rest.
    pub async fn process_batch(&self, filter: &AuditFilter) -> Result<Vec<FixResult>> {
        let errors = self.audit.fetch_unprocessed(filter).await?;
        info!(event = "batch.started", total = errors.len());

        let mut results = Vec::with_capacity(errors.len());
        for error in &errors {
            results.push(self.process_error(error).await);
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        obs::emit_batch_finished(results.len(), succeeded);
        Ok(results)
    }

    /// Cancel an in-flight fix-agent run. Explicit operator action; the
    /// workflow never cancels runs on its own (a timed-out run keeps
    /// executing on the agent side).
    pub async fn cancel_fix_run(&self, run_id: &str) -> Result<()> {
        self.agent.cancel(run_id).await?;
        info!(event = "agent.run_cancelled", run_id = %run_id);
        Ok(())
    }

    async fn attempt(&self, error: &AuditError, ctx: &mut RunContext) -> Result<FixResult> {
        ctx.enter(&error.id, WorkflowStage::ParsingError, "classifying stack trace");
        let trace = stack_trace::parse(&error.stack_trace, Some(&error.message));

        ctx.enter(
            &error.id,
            WorkflowStage::FindingRepository,
            "resolving owning repository",
        );
        let repo = self
            .resolver
            .resolve(error, &trace)
            .await?
            .ok_or_else(|| FixflowError::RepositoryNotFound(error.id.clone()))?;
        ctx.repository = Some(repo.clone());

        ctx.enter(&error.id, WorkflowStage::CreatingWorkItem, "filing bug work item");
        let draft = ticket::build_bug_draft(error, &trace, &repo, &self.config);
        let work_item = self.tracker.create_bug(draft).await?;
        ctx.work_item_id = Some(work_item.id);

        ctx.enter(&error.id, WorkflowStage::CreatingBranch, "creating fix branch");
        let branch = branch_name(&error.id);
        self.host
            .create_branch(&repo.owner, &repo.name, &branch, &repo.default_branch)
            .await?;
        ctx.branch = Some(branch.clone());

        ctx.enter(&error.id, WorkflowStage::RunningFixAgent, "running fix agent");
        let task = FixTask {
            error_message: trace.error_message.clone(),
            stack_trace: trace.clone(),
            repository: repo.full_name.clone(),
            branch: branch.clone(),
            context: format!(
                "Audit error {} from {} ({}), tracked as work item #{}",
                error.id, error.source, error.environment, work_item.id
            ),
            work_item_id: Some(work_item.id),
            environment_id: self.config.agent_environment_id.clone(),
        };
        let run_id = self.agent.submit(task).await?;
        ctx.agent_run_id = Some(run_id.clone());

        let outcome = match self
            .agent
            .wait_for_completion(&run_id, self.config.fix_agent_timeout)
            .await
        {
            Ok(outcome) => outcome,
            Err(PortError::Timeout { waited_ms }) => {
                return Err(FixflowError::FixAgentTimeout { run_id, waited_ms });
            }
            Err(other) => return Err(other.into()),
        };
        if !outcome.success {
            return Err(FixflowError::FixAgentFailed(
                outcome
                    .error
                    .unwrap_or_else(|| "agent reported failure without detail".to_string()),
            ));
        }

        ctx.enter(
            &error.id,
            WorkflowStage::CreatingPullRequest,
            "opening pull request",
        );
        let pr = self
            .host
            .create_pull_request(PullRequestDraft {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
                title: format!(
                    "[Auto-Fix] {}",
                    ticket::truncate(&error.message, 100)
                ),
                body: format!(
                    "Automated fix for audit error `{}` (work item #{}).\n\n{}",
                    error.id, work_item.id, outcome.summary
                ),
                head: branch.clone(),
                base: repo.default_branch.clone(),
                draft: true,
            })
            .await?;
        self.tracker.link_pull_request(work_item.id, &pr.url).await?;
        self.tracker
            .add_comment(
                work_item.id,
                &format!("Automated fix prepared: {} — {}", pr.url, outcome.summary),
            )
            .await?;

        ctx.enter(&error.id, WorkflowStage::NotifyingTeam, "announcing fix");
        self.notifier
            .notify_pr_created(&repo.full_name, work_item.id, &outcome.summary, &pr.url)
            .await?;

        // Durability boundary: only after everything above succeeded does
        // the error stop being picked up by future batches.
        let mut metadata = BTreeMap::new();
        metadata.insert("work_item_id".to_string(), work_item.id.to_string());
        metadata.insert("pr_url".to_string(), pr.url.clone());
        metadata.insert("branch".to_string(), branch.clone());
        metadata.insert("agent_run_id".to_string(), run_id.clone());
        self.audit.mark_processed(&error.id, Some(metadata)).await?;
        self.audit
            .update_fix_info(
                &error.id,
                FixInfo {
                    work_item_id: Some(work_item.id),
                    pr_url: Some(pr.url.clone()),
                    branch: Some(branch.clone()),
                    agent_run_id: Some(run_id.clone()),
                    fixed_at: Utc::now(),
                },
            )
            .await?;

        ctx.status = ctx.status.complete("fix delivered");
        Ok(FixResult {
            error_id: error.id.clone(),
            success: true,
            repository: Some(repo.full_name),
            work_item_id: Some(work_item.id),
            branch: Some(branch),
            agent_run_id: Some(run_id),
            pr_url: Some(pr.url),
            pr_number: Some(pr.number),
            summary: outcome.summary,
            modified_files: outcome.modified_files,
            error: None,
            completed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_name_is_deterministic() {
        assert_eq!(branch_name("err-42"), "bug/auto-fix-err-42");
        assert_eq!(branch_name("err-42"), branch_name("err-42"));
    }
}
