//! Application state.

use std::sync::Arc;
use std::time::Duration;

use pipeweld_core::ContentProvider;
use pipeweld_github::{AppCredentials, GitHubClient, TokenCache};
use pipeweld_resolver::Resolver;

use crate::settings::Settings;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub provider: Arc<dyn ContentProvider>,
    pub resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let credentials = AppCredentials::new(
            settings.github_app_id.clone(),
            settings.github_installation_id.clone(),
            settings.github_private_key.as_bytes(),
            client.clone(),
        )?
        .with_api_url(settings.github_api_url.clone());
        let tokens = TokenCache::new(Arc::new(credentials));
        let provider: Arc<dyn ContentProvider> =
            Arc::new(GitHubClient::new(client, tokens).with_api_url(settings.github_api_url.clone()));

        let resolver = Resolver::new(provider.clone())
            .with_dependency_injection(settings.inject_dependencies);

        Ok(Self {
            settings: Arc::new(settings),
            provider,
            resolver: Arc::new(resolver),
        })
    }
}
