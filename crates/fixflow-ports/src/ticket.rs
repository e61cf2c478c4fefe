//! Issue-tracker and source-host payload records.

use serde::{Deserialize, Serialize};

/// Payload for creating a bug work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugDraft {
    pub title: String,
    pub description: String,
    pub repro_steps: String,
    pub system_info: String,

    /// Numeric priority, 1 (highest) to 4 (lowest).
    pub priority: u8,

    /// Textual severity label ("Critical", "High", "Medium", "Low").
    pub severity_label: String,

    pub tags: Vec<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,

    /// Audit error this bug was created for.
    pub source_error_id: String,
}

/// A created/fetched issue-tracker work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u64,
    pub title: String,
    pub state: String,
    pub url: Option<String>,
}

/// One file to push to a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

/// Payload for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDraft {
    pub owner: String,
    pub repo: String,
    pub title: String,
    pub body: String,

    /// Source branch.
    pub head: String,

    /// Target branch.
    pub base: String,

    pub draft: bool,
}

/// Identity of a created pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub url: String,
    pub number: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bug_draft_serde_roundtrip() {
        let draft = BugDraft {
            title: "[Auto-Fix] checkout-api: TypeError".to_string(),
            description: "stack".to_string(),
            repro_steps: "observed in production".to_string(),
            system_info: "env: production".to_string(),
            priority: 2,
            severity_label: "High".to_string(),
            tags: vec!["auto-fix".to_string()],
            area_path: Some("Platform\\Payments".to_string()),
            iteration_path: None,
            source_error_id: "err-1".to_string(),
        };
        let json = serde_json::to_string(&draft).expect("serialize");
        let back: BugDraft = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(draft, back);
    }
}
