//! GitHub content and commit-status API client.

use async_trait::async_trait;
use bytes::Bytes;

use pipeweld_core::{ContentProvider, ProviderError, Repo, StatusEntry};

use crate::auth::TokenCache;
use crate::{GITHUB_API_URL, USER_AGENT};

/// GitHub API client backed by app-installation tokens.
pub struct GitHubClient {
    client: reqwest::Client,
    tokens: TokenCache,
    api_url: String,
}

impl GitHubClient {
    pub fn new(client: reqwest::Client, tokens: TokenCache) -> Self {
        Self {
            client,
            tokens,
            api_url: GITHUB_API_URL.to_string(),
        }
    }

    /// Point the client at a different API base URL (GitHub Enterprise,
    /// test servers).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ContentProvider for GitHubClient {
    /// Fetch raw file content at a path and commit via the contents API.
    async fn fetch(&self, repo: &Repo, path: &str, commit: &str) -> Result<Bytes, ProviderError> {
        let token = self.tokens.get_token().await?;
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, repo.namespace, repo.name, path
        );

        let response = self
            .client
            .get(&url)
            .query(&[("ref", commit)])
            .header("Authorization", format!("Bearer {token}"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github.raw+json")
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "failed to fetch {path} ({status}): {text}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))
    }

    async fn create_status(
        &self,
        repo: &Repo,
        commit: &str,
        status: &StatusEntry,
    ) -> Result<(), ProviderError> {
        let token = self.tokens.get_token().await?;
        let url = format!(
            "{}/repos/{}/{}/statuses/{}",
            self.api_url, repo.namespace, repo.name, commit
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .json(status)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let code = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "failed to create status ({code}): {text}"
            )));
        }

        Ok(())
    }
}
