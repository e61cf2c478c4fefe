//! Bug draft assembly for the issue tracker.

use fixflow_ports::{AuditError, BugDraft, ParsedStackTrace, RepositoryDescriptor};

use crate::config::WorkflowConfig;

const TITLE_MESSAGE_LIMIT: usize = 120;

/// Build the tracker draft for one audit error. The marker tag lets
/// later runs recognize items this system created; the agent tag marks
/// them as machine-filed.
pub fn build_bug_draft(
    error: &AuditError,
    trace: &ParsedStackTrace,
    repository: &RepositoryDescriptor,
    config: &WorkflowConfig,
) -> BugDraft {
    let mut tags = vec![
        config.marker_tag.clone(),
        config.agent_tag.clone(),
        error.source.clone(),
        error.environment.clone(),
        repository.name.clone(),
    ];
    if let Some(tag) = trace.language.tag() {
        tags.push(tag.to_string());
    }

    let mut description = format!(
        "Automated fix candidate for audit error `{}`.\n\n\
         **Message:** {}\n\
         **Repository:** {}\n\
         **Source:** {} ({})\n",
        error.id, error.message, repository.full_name, error.source, error.environment,
    );
    if let Some(error_type) = &trace.error_type {
        description.push_str(&format!("**Error type:** {error_type}\n"));
    }
    if !error.stack_trace.is_empty() {
        description.push_str(&format!("\n```\n{}\n```\n", error.stack_trace.trim_end()));
    }

    let mut system_info = format!("Environment: {}", error.environment);
    if let Some(sha) = &error.commit_sha {
        system_info.push_str(&format!("\nCommit: {sha}"));
    }

    BugDraft {
        title: format!(
            "[Auto-Fix] {}: {}",
            error.source,
            truncate(&error.message, TITLE_MESSAGE_LIMIT)
        ),
        description,
        repro_steps: format!(
            "Observed in {} on {} at {}",
            error.source, error.environment, error.timestamp
        ),
        system_info,
        priority: error.severity.priority(),
        severity_label: error.severity.label().to_string(),
        tags,
        area_path: area_path_for(config, &error.source, &repository.name),
        iteration_path: config.iteration_path.clone(),
        source_error_id: error.id.clone(),
    }
}

/// Pick an area path from the configured keyword rules. Requires a
/// project to be configured. The error source is tested against every
/// rule before the repository name is considered; within each pass the
/// first matching rule wins.
pub fn area_path_for(config: &WorkflowConfig, source: &str, repo_name: &str) -> Option<String> {
    let project = config.project.as_ref()?;
    let source = source.to_lowercase();
    let repo_name = repo_name.to_lowercase();

    let matched = config
        .area_rules
        .iter()
        .find(|rule| source.contains(&rule.keyword.to_lowercase()))
        .or_else(|| {
            config
                .area_rules
                .iter()
                .find(|rule| repo_name.contains(&rule.keyword.to_lowercase()))
        })?;

    Some(format!("{}\\{}", project, matched.area_path))
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixflow_ports::Severity;

    fn config() -> WorkflowConfig {
        WorkflowConfig::default()
            .with_project("Platform")
            .with_area_rule("checkout", "Payments")
            .with_area_rule("web", "Frontend")
    }

    fn repo() -> RepositoryDescriptor {
        RepositoryDescriptor::new("acme", "web-app", "https://github.com/acme/web-app", "main")
    }

    #[test]
    fn test_draft_carries_marker_and_language_tags() {
        let raw = "TypeError: boom\n    at run (/srv/app/src/main.ts:3:1)";
        let error = AuditError::new(
            "err-1",
            "boom",
            raw,
            Severity::Error,
            "checkout-api",
            "production",
        );
        let trace = crate::stack_trace::parse(raw, Some("boom"));
        let draft = build_bug_draft(&error, &trace, &repo(), &config());

        assert!(draft.tags.contains(&"auto-fix".to_string()));
        assert!(draft.tags.contains(&"ai-agent".to_string()));
        assert!(draft.tags.contains(&"typescript".to_string()));
        assert!(draft.tags.contains(&"web-app".to_string()));
        assert_eq!(draft.priority, 2);
        assert_eq!(draft.severity_label, "High");
        assert_eq!(draft.source_error_id, "err-1");
        assert!(draft.title.starts_with("[Auto-Fix] checkout-api:"));
        assert!(draft.description.contains("err-1"));
    }

    #[test]
    fn test_unknown_language_adds_no_language_tag() {
        let error = AuditError::new(
            "err-2",
            "boom",
            "something unstructured",
            Severity::Warning,
            "batch",
            "staging",
        );
        let trace = crate::stack_trace::parse("something unstructured", None);
        let draft = build_bug_draft(&error, &trace, &repo(), &config());
        assert!(!draft.tags.iter().any(|t| t == "unknown"));
    }

    #[test]
    fn test_area_path_prefers_source_over_repo_name() {
        let config = config();
        // "web" matches the repo name, but the source match on a later
        // rule would lose to a source match; here source matches nothing,
        // so the repo pass applies.
        assert_eq!(
            area_path_for(&config, "billing-api", "web-app").as_deref(),
            Some("Platform\\Frontend")
        );
        // Source match wins even when the repo name matches another rule.
        assert_eq!(
            area_path_for(&config, "checkout-api", "web-app").as_deref(),
            Some("Platform\\Payments")
        );
    }

    #[test]
    fn test_area_path_requires_project() {
        let config = WorkflowConfig::default().with_area_rule("web", "Frontend");
        assert_eq!(area_path_for(&config, "web-api", "web-app"), None);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ab", 1), "a...");
        assert_eq!(truncate("日本語のエラー", 3), "日本語...");
    }
}
