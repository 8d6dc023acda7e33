//! Resolution errors.

use pipeweld_core::ProviderError;
use thiserror::Error;

/// Any of these aborts the whole resolution call; none are retried.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to fetch {path}: {source}")]
    FetchFailed {
        path: String,
        #[source]
        source: ProviderError,
    },

    #[error("failed to decode {path}: {message}")]
    DecodeFailed { path: String, message: String },

    #[error("cycle detected at {0}")]
    CycleDetected(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("failed to render template {name}: {message}")]
    TemplateRenderFailed { name: String, message: String },

    #[error("credential refresh failed: {0}")]
    CredentialFailed(#[source] ProviderError),

    #[error("resolution timed out")]
    Timeout,
}
