//! Audit-log error records produced by the upstream error producer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Urgency of an audit error, totally ordered (Info lowest, Critical highest).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Issue-tracker priority for this severity. Fixed total mapping:
    /// critical -> 1 down to info -> 4.
    pub fn priority(self) -> u8 {
        match self {
            Severity::Critical => 1,
            Severity::Error => 2,
            Severity::Warning => 3,
            Severity::Info => 4,
        }
    }

    /// Textual severity label used on created work items.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Error => "High",
            Severity::Warning => "Medium",
            Severity::Info => "Low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{s}")
    }
}

/// Fix bookkeeping persisted onto an audit error after a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixInfo {
    pub work_item_id: Option<u64>,
    pub pr_url: Option<String>,
    pub branch: Option<String>,
    pub agent_run_id: Option<String>,
    pub fixed_at: DateTime<Utc>,
}

/// One raw application error as recorded by the audit-log store.
///
/// Created by the upstream producer; the workflow only flips the processed
/// flag and attaches metadata/fix info. Never deleted by this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditError {
    /// Unique identifier assigned by the producer.
    pub id: String,

    /// When the error was observed.
    pub timestamp: DateTime<Utc>,

    /// Error message as reported.
    pub message: String,

    /// Raw stack trace text, verbatim.
    pub stack_trace: String,

    pub severity: Severity,

    /// Free-text name of the emitting service.
    pub source: String,

    /// Deployment environment ("production", "staging", ...).
    pub environment: String,

    /// Commit deployed when the error occurred, if known.
    pub commit_sha: Option<String>,

    /// Explicit "owner/name" repository hint from the producer, if any.
    pub repository_hint: Option<String>,

    /// Whether the workflow has already handled this error.
    pub processed: bool,

    /// Arbitrary key/value metadata, merged on mark-processed.
    pub metadata: BTreeMap<String, String>,

    /// Fix bookkeeping, populated after a successful run.
    pub fix_info: Option<FixInfo>,
}

impl AuditError {
    /// Create an unprocessed error record.
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        stack_trace: impl Into<String>,
        severity: Severity,
        source: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            message: message.into(),
            stack_trace: stack_trace.into(),
            severity,
            source: source.into(),
            environment: environment.into(),
            commit_sha: None,
            repository_hint: None,
            processed: false,
            metadata: BTreeMap::new(),
            fix_info: None,
        }
    }

    pub fn with_repository_hint(mut self, full_name: impl Into<String>) -> Self {
        self.repository_hint = Some(full_name.into());
        self
    }
}

/// Filter for fetching unprocessed errors from the audit store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Restrict to these severities (None = all).
    pub severities: Option<Vec<Severity>>,

    /// Restrict to one emitting service.
    pub source: Option<String>,

    /// Only errors observed at or after this instant.
    pub since: Option<DateTime<Utc>>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,
}
