//! Repository resolution: maps an error plus its parsed trace to a
//! concrete source repository.
//!
//! The heuristics run as an ordered chain of independent attempts, first
//! confirmed lookup wins. The order encodes a trust hierarchy: explicit
//! data beats configured mapping beats inferred-from-evidence beats fuzzy
//! search. "Not found" is a normal outcome (`Ok(None)`); only collaborator
//! failures propagate.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use fixflow_ports::{
    split_full_name, AuditError, ParsedStackTrace, RepositoryDescriptor, SourceHost,
};

use crate::error::Result;

/// Default branch assigned to search-fallback resolutions.
///
/// Search hits do not report a default branch; the descriptor is returned
/// best-effort with this placeholder instead of failing. Known caveat:
/// later branch operations will target this branch, which may not be the
/// repository's actual default.
pub const SEARCH_FALLBACK_DEFAULT_BRANCH: &str = "main";

/// Embedded `host/owner/repo` pattern inside a frame's file path.
fn hosted_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:github\.com|gitlab\.com|bitbucket\.org)[/:]([\w.-]+)/([\w.-]+?)(?:\.git)?(?:[/:]|$)")
            .expect("hard-coded pattern compiles")
    })
}

/// Resolves the owning repository for an audit error.
pub struct RepositoryResolver {
    host: Arc<dyn SourceHost>,
    source_repositories: BTreeMap<String, String>,
}

impl RepositoryResolver {
    pub fn new(host: Arc<dyn SourceHost>, source_repositories: BTreeMap<String, String>) -> Self {
        Self {
            host,
            source_repositories,
        }
    }

    /// Run the heuristic chain. `Ok(None)` when nothing matched.
    pub async fn resolve(
        &self,
        error: &AuditError,
        trace: &ParsedStackTrace,
    ) -> Result<Option<RepositoryDescriptor>> {
        if let Some(repo) = self.try_hint(error).await? {
            debug!(error_id = %error.id, repo = %repo.full_name, "resolved via explicit hint");
            return Ok(Some(repo));
        }
        if let Some(repo) = self.try_source_mapping(error).await? {
            debug!(error_id = %error.id, repo = %repo.full_name, "resolved via source mapping");
            return Ok(Some(repo));
        }
        if let Some(repo) = self.try_frame_paths(trace).await? {
            debug!(error_id = %error.id, repo = %repo.full_name, "resolved via stack frames");
            return Ok(Some(repo));
        }
        if let Some(repo) = self.try_search(error, trace).await? {
            debug!(error_id = %error.id, repo = %repo.full_name, "resolved via search");
            return Ok(Some(repo));
        }
        debug!(error_id = %error.id, "no repository resolved");
        Ok(None)
    }

    /// Direct lookup by full name; malformed names are no match, not errors.
    async fn lookup(&self, full_name: &str) -> Result<Option<RepositoryDescriptor>> {
        let Some((owner, name)) = split_full_name(full_name) else {
            return Ok(None);
        };
        Ok(self.host.get_repository(owner, name).await?)
    }

    async fn try_hint(&self, error: &AuditError) -> Result<Option<RepositoryDescriptor>> {
        match &error.repository_hint {
            Some(hint) => self.lookup(hint).await,
            None => Ok(None),
        }
    }

    async fn try_source_mapping(&self, error: &AuditError) -> Result<Option<RepositoryDescriptor>> {
        match self.source_repositories.get(&error.source) {
            Some(full_name) => self.lookup(full_name).await,
            None => Ok(None),
        }
    }

    /// Scan first-party frames in original order for an embedded
    /// host/owner/repo path or an explicit repository association.
    async fn try_frame_paths(
        &self,
        trace: &ParsedStackTrace,
    ) -> Result<Option<RepositoryDescriptor>> {
        for frame in trace.first_party_frames() {
            if let Some(caps) = hosted_path().captures(&frame.file) {
                let full_name = format!("{}/{}", &caps[1], &caps[2]);
                if let Some(repo) = self.lookup(&full_name).await? {
                    return Ok(Some(repo));
                }
            } else if let Some(association) = &frame.repository {
                if let Some(repo) = self.lookup(association).await? {
                    return Ok(Some(repo));
                }
            }
        }
        Ok(None)
    }

    /// One fuzzy search built from the error source and up to three distinct
    /// file stems from the first three first-party frames. Best-effort: the
    /// returned descriptor carries a placeholder default branch.
    async fn try_search(
        &self,
        error: &AuditError,
        trace: &ParsedStackTrace,
    ) -> Result<Option<RepositoryDescriptor>> {
        let mut terms = vec![error.source.clone()];
        for frame in trace.first_party_frames().take(3) {
            let stem = frame.file_stem().to_string();
            if !stem.is_empty() && !terms.contains(&stem) {
                terms.push(stem);
            }
        }
        let query = terms.join(" ");

        let hits = self.host.search_repositories(&query).await?;
        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(RepositoryDescriptor {
            owner: hit.owner,
            name: hit.name,
            full_name: hit.full_name,
            url: hit.url,
            default_branch: SEARCH_FALLBACK_DEFAULT_BRANCH.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fixflow_ports::fakes::MemorySourceHost;
    use fixflow_ports::{Frame, Language, RepositorySearchHit, Severity};

    fn checkout_repo() -> RepositoryDescriptor {
        RepositoryDescriptor::new(
            "acme",
            "checkout",
            "https://github.com/acme/checkout",
            "develop",
        )
    }

    fn error_with_hint(hint: Option<&str>) -> AuditError {
        let mut error = AuditError::new(
            "err-1",
            "boom",
            "stack",
            Severity::Error,
            "checkout-api",
            "production",
        );
        error.repository_hint = hint.map(str::to_string);
        error
    }

    fn empty_trace() -> ParsedStackTrace {
        ParsedStackTrace {
            raw: String::new(),
            frames: Vec::new(),
            language: Language::Unknown,
            error_type: None,
            error_message: String::new(),
        }
    }

    fn trace_with_frames(frames: Vec<Frame>) -> ParsedStackTrace {
        ParsedStackTrace {
            frames,
            ..empty_trace()
        }
    }

    #[tokio::test]
    async fn hint_wins_without_consulting_anything_else() {
        let host = Arc::new(MemorySourceHost::new().with_repository(checkout_repo()));
        let mut mapping = BTreeMap::new();
        mapping.insert("checkout-api".to_string(), "acme/other".to_string());
        let resolver = RepositoryResolver::new(host.clone(), mapping);

        let repo = resolver
            .resolve(&error_with_hint(Some("acme/checkout")), &empty_trace())
            .await
            .expect("resolve")
            .expect("resolved");
        assert_eq!(repo.full_name, "acme/checkout");
        assert_eq!(repo.default_branch, "develop");
        assert_eq!(host.lookup_calls(), 1);
        assert_eq!(host.search_calls(), 0);
    }

    #[tokio::test]
    async fn malformed_hint_is_skipped_not_an_error() {
        let host = Arc::new(MemorySourceHost::new().with_repository(checkout_repo()));
        let mut mapping = BTreeMap::new();
        mapping.insert("checkout-api".to_string(), "acme/checkout".to_string());
        let resolver = RepositoryResolver::new(host.clone(), mapping);

        let repo = resolver
            .resolve(&error_with_hint(Some("not-a-full-name")), &empty_trace())
            .await
            .expect("resolve")
            .expect("resolved via mapping");
        assert_eq!(repo.full_name, "acme/checkout");
        // Malformed hint never reached the host.
        assert_eq!(host.lookup_calls(), 1);
    }

    #[tokio::test]
    async fn frame_scan_finds_embedded_hosted_path() {
        let host = Arc::new(MemorySourceHost::new().with_repository(checkout_repo()));
        let resolver = RepositoryResolver::new(host.clone(), BTreeMap::new());

        let mut vendor = Frame::for_file("github.com/evil/dep/lib.go");
        vendor.first_party = false;
        let trace = trace_with_frames(vec![
            vendor,
            Frame::for_file("/go/src/github.com/acme/checkout/cart/cart.go"),
        ]);

        let repo = resolver
            .resolve(&error_with_hint(None), &trace)
            .await
            .expect("resolve")
            .expect("resolved");
        assert_eq!(repo.full_name, "acme/checkout");
        // Vendor frame skipped entirely; only one lookup issued.
        assert_eq!(host.lookup_calls(), 1);
    }

    #[tokio::test]
    async fn frame_repository_association_is_used() {
        let host = Arc::new(MemorySourceHost::new().with_repository(checkout_repo()));
        let resolver = RepositoryResolver::new(host.clone(), BTreeMap::new());

        let mut annotated = Frame::for_file("src/cart.ts");
        annotated.repository = Some("acme/checkout".to_string());
        let trace = trace_with_frames(vec![annotated]);

        let repo = resolver
            .resolve(&error_with_hint(None), &trace)
            .await
            .expect("resolve")
            .expect("resolved");
        assert_eq!(repo.full_name, "acme/checkout");
    }

    #[tokio::test]
    async fn search_fallback_uses_placeholder_default_branch() {
        let host = Arc::new(MemorySourceHost::new());
        host.set_search_results(vec![RepositorySearchHit {
            owner: "acme".to_string(),
            name: "checkout".to_string(),
            full_name: "acme/checkout".to_string(),
            url: "https://github.com/acme/checkout".to_string(),
        }]);
        let resolver = RepositoryResolver::new(host.clone(), BTreeMap::new());

        let trace = trace_with_frames(vec![
            Frame::for_file("src/views/checkout.ts"),
            Frame::for_file("src/cart/totals.ts"),
        ]);
        let repo = resolver
            .resolve(&error_with_hint(None), &trace)
            .await
            .expect("resolve")
            .expect("resolved");
        assert_eq!(repo.full_name, "acme/checkout");
        assert_eq!(repo.default_branch, SEARCH_FALLBACK_DEFAULT_BRANCH);
        assert_eq!(host.search_calls(), 1);
    }

    #[tokio::test]
    async fn nothing_matches_yields_none() {
        let host = Arc::new(MemorySourceHost::new());
        let resolver = RepositoryResolver::new(host.clone(), BTreeMap::new());

        let resolved = resolver
            .resolve(&error_with_hint(None), &empty_trace())
            .await
            .expect("resolve");
        assert!(resolved.is_none());
        // The chain fell through to exactly one search call.
        assert_eq!(host.search_calls(), 1);
        assert_eq!(host.lookup_calls(), 0);
    }
}
