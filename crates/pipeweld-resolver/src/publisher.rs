//! Asynchronous commit-status publishing.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::warn;

use pipeweld_core::{ContentProvider, Repo, StatusEntry};

/// Publish status entries in the background after a successful
/// resolution.
///
/// Each entry is submitted independently; failures are logged and
/// dropped. The handle is returned so tests can await completion;
/// callers normally discard it.
pub fn publish(
    provider: Arc<dyn ContentProvider>,
    repo: Repo,
    commit: String,
    statuses: Vec<StatusEntry>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for status in &statuses {
            if let Err(e) = provider.create_status(&repo, &commit, status).await {
                warn!(context = %status.context, error = %e, "unable to publish status");
            }
        }
    })
}
