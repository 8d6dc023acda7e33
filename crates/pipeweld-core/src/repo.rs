//! Repository coordinates.

use serde::{Deserialize, Serialize};

/// Coordinates of the repository a build belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repo {
    /// Owner or organization.
    pub namespace: String,
    /// Repository name.
    pub name: String,
    /// Base URL of the repository on the hosting service, used to build
    /// links to expanded files.
    pub http_url: String,
}

impl Repo {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        http_url: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            http_url: http_url.into(),
        }
    }
}
