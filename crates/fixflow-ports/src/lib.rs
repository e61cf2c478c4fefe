//! Capability contracts and domain records for Fixflow.
//!
//! This crate defines what the decision engine talks to, not how it is
//! implemented:
//! - domain records (`AuditError`, `ParsedStackTrace`, `RepositoryDescriptor`, ...)
//! - five async capability contracts (`AuditStore`, `IssueTracker`,
//!   `SourceHost`, `ChatNotifier`, `FixAgent`)
//! - the collaborator failure taxonomy (`PortError`)
//!
//! All contracts are backend-agnostic. In-memory fakes are provided for
//! testing via the `fakes` module.

pub mod agent;
pub mod audit;
pub mod contracts;
pub mod error;
pub mod fakes;
pub mod notify;
pub mod repo;
pub mod ticket;
pub mod trace;

pub use agent::{FixOutcome, FixRunState, FixRunStatus, FixTask, ModifiedFile};
pub use audit::{AuditError, AuditFilter, FixInfo, Severity};
pub use contracts::{AuditStore, ChatNotifier, FixAgent, IssueTracker, SourceHost};
pub use error::{PortError, PortResult};
pub use fakes::{
    fix_info_now, BranchRecord, MemoryAuditStore, MemoryChatNotifier, MemoryFixAgent,
    MemoryIssueTracker, MemorySourceHost,
};
pub use notify::{ChannelMessage, Importance};
pub use repo::{split_full_name, RepositoryDescriptor, RepositorySearchHit};
pub use ticket::{BugDraft, FileChange, PullRequestDraft, PullRequestInfo, WorkItem};
pub use trace::{Frame, Language, ParsedStackTrace};
