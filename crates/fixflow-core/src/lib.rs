//! Fixflow Core Library
//!
//! The error-to-fix decision engine: classifies raw stack traces into
//! structured, language-tagged call stacks, resolves the owning source
//! repository, and drives the ticket -> branch -> fix agent -> pull request
//! workflow with explicit partial-failure semantics.
//!
//! External systems (audit store, issue tracker, source host, chat,
//! fix agent) are consumed through the contracts in `fixflow-ports`.

pub mod config;
pub mod error;
pub mod obs;
pub mod resolver;
pub mod stack_trace;
pub mod telemetry;
pub mod workflow;

pub use config::{AreaRule, WorkflowConfig};
pub use error::{FixflowError, Result};
pub use obs::{
    emit_batch_finished, emit_error_processed, emit_error_started, emit_stage_entered, ErrorSpan,
};
pub use resolver::{RepositoryResolver, SEARCH_FALLBACK_DEFAULT_BRANCH};
pub use stack_trace::parse;
pub use telemetry::init_tracing;
pub use workflow::{
    branch_name, FixResult, FixWorkflow, WorkflowStage, WorkflowStatus,
};

/// Fixflow version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
