//! Source repository identity records.

use serde::{Deserialize, Serialize};

/// Split an "owner/name" full name into its two segments.
///
/// Returns `None` for malformed names (missing or empty owner/repo segment,
/// or extra separators); callers treat that as "no match", never an error.
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let (owner, name) = full_name.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}

/// A concrete, resolved source repository.
///
/// Invariant: `full_name` always equals `"{owner}/{name}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub default_branch: String,
}

impl RepositoryDescriptor {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        default_branch: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        let name = name.into();
        let full_name = format!("{owner}/{name}");
        Self {
            owner,
            name,
            full_name,
            url: url.into(),
            default_branch: default_branch.into(),
        }
    }
}

/// One fuzzy-search result from the source host.
///
/// Carries identity only; search results do not report a default branch,
/// so none is included here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySearchHit {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub url: String,
}
