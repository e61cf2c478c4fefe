//! Explicit workflow configuration.
//!
//! Constructed once at startup and passed by value into
//! [`crate::workflow::FixWorkflow::new`]; the engine reads no ambient
//! environment state.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One keyword -> area-path rule for work-item routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaRule {
    /// Case-insensitive substring tested against the error source first,
    /// then the repository short name.
    pub keyword: String,
    pub area_path: String,
}

/// Configuration for the fix workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Marker tag applied to every created work item.
    pub marker_tag: String,

    /// Tag identifying agent-created work items.
    pub agent_tag: String,

    /// Static service-source -> repository full-name mapping, consulted
    /// after the explicit repository hint.
    pub source_repositories: BTreeMap<String, String>,

    /// Keyword -> area-path routing table, first match wins.
    pub area_rules: Vec<AreaRule>,

    /// Issue-tracker project context. When absent no area path is derived.
    pub project: Option<String>,

    /// Iteration path applied to created work items, if any.
    pub iteration_path: Option<String>,

    /// Fix-agent execution environment identifier, agent-specific.
    pub agent_environment_id: Option<String>,

    /// Bound on waiting for a fix-agent run to complete.
    #[serde(with = "duration_secs")]
    pub fix_agent_timeout: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            marker_tag: "auto-fix".to_string(),
            agent_tag: "ai-agent".to_string(),
            source_repositories: BTreeMap::new(),
            area_rules: Vec::new(),
            project: None,
            iteration_path: None,
            agent_environment_id: None,
            // Generous: agent runs routinely take many minutes.
            fix_agent_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl WorkflowConfig {
    /// Map an error source to a repository full name.
    pub fn with_source_repository(
        mut self,
        source: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        self.source_repositories
            .insert(source.into(), full_name.into());
        self
    }

    pub fn with_area_rule(
        mut self,
        keyword: impl Into<String>,
        area_path: impl Into<String>,
    ) -> Self {
        self.area_rules.push(AreaRule {
            keyword: keyword.into(),
            area_path: area_path.into(),
        });
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkflowConfig::default();
        assert_eq!(config.marker_tag, "auto-fix");
        assert_eq!(config.agent_tag, "ai-agent");
        assert_eq!(config.fix_agent_timeout, Duration::from_secs(1800));
        assert!(config.project.is_none());
    }

    #[test]
    fn test_builder_helpers() {
        let config = WorkflowConfig::default()
            .with_source_repository("checkout-api", "acme/checkout")
            .with_area_rule("payment", "Platform\\Payments")
            .with_project("Platform");
        assert_eq!(
            config.source_repositories["checkout-api"],
            "acme/checkout"
        );
        assert_eq!(config.area_rules[0].keyword, "payment");
        assert_eq!(config.project.as_deref(), Some("Platform"));
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = WorkflowConfig::default().with_project("Platform");
        let json = serde_json::to_string(&config).expect("serialize");
        let back: WorkflowConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(config, back);
    }
}
