//! Commit-status entries for expanded pipeline files.

use serde::Serialize;

use crate::Repo;

/// Context prefix for statuses published against expanded files.
pub const STATUS_CONTEXT_PREFIX: &str = "pipeweld";

/// One commit status linking back to an expanded pipeline file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    pub state: String,
    pub target_url: String,
    pub context: String,
}

impl StatusEntry {
    /// A success status for the file at `path` as of `commit`.
    pub fn success(repo: &Repo, commit: &str, path: &str) -> Self {
        Self {
            state: "success".to_string(),
            target_url: format!(
                "{}/blob/{}/{}",
                repo.http_url.trim_end_matches('/'),
                commit,
                path
            ),
            context: format!("{STATUS_CONTEXT_PREFIX}/{path}"),
        }
    }
}
