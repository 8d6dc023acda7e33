//! Content provider trait and errors.
//!
//! Implemented by the GitHub client in `pipeweld-github`; the resolver
//! only sees this seam, so tests can substitute an in-memory provider.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::{Repo, StatusEntry};

/// Errors from a content provider or its credential source.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("credential refresh failed: {0}")]
    Credential(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Fetches repository content and publishes commit statuses.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch raw file content at a path and commit.
    async fn fetch(&self, repo: &Repo, path: &str, commit: &str) -> Result<Bytes, ProviderError>;

    /// Publish one commit status.
    async fn create_status(
        &self,
        repo: &Repo,
        commit: &str,
        status: &StatusEntry,
    ) -> Result<(), ProviderError>;
}
