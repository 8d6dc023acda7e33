//! GitHub App authentication.
//!
//! Outbound API calls authenticate with short-lived installation tokens.
//! `TokenCache` holds the current token and refreshes it on demand. The
//! whole check-then-refresh sequence runs under one async mutex, so
//! concurrent callers wait on the in-flight refresh instead of starting
//! their own.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use pipeweld_core::ProviderError;

use crate::{GITHUB_API_URL, USER_AGENT};

/// A token is refreshed once its expiry is closer than this margin.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// Lifetime of the signed app assertion exchanged for a token.
const ASSERTION_LIFETIME_SECS: i64 = 10;

/// An installation access token with its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token is still usable at `now`, keeping the refresh
    /// margin.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

/// Produces fresh installation tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self) -> Result<AccessToken, ProviderError>;
}

/// GitHub App credentials.
///
/// Signs a short-lived RS256 assertion with the app's private key and
/// exchanges it for an installation-scoped access token.
pub struct AppCredentials {
    app_id: String,
    installation_id: String,
    key: EncodingKey,
    api_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct Assertion {
    iss: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenPayload {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AppCredentials {
    pub fn new(
        app_id: impl Into<String>,
        installation_id: impl Into<String>,
        private_key_pem: &[u8],
        client: reqwest::Client,
    ) -> Result<Self, ProviderError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| ProviderError::Credential(format!("invalid private key: {e}")))?;

        Ok(Self {
            app_id: app_id.into(),
            installation_id: installation_id.into(),
            key,
            api_url: GITHUB_API_URL.to_string(),
            client,
        })
    }

    /// Point the exchange at a different API base URL (GitHub Enterprise,
    /// test servers).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TokenSource for AppCredentials {
    async fn fetch(&self) -> Result<AccessToken, ProviderError> {
        let now = Utc::now();
        let claims = Assertion {
            iss: self.app_id.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| ProviderError::Credential(format!("signing assertion: {e}")))?;

        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_url, self.installation_id
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {assertion}"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ProviderError::Credential(e.to_string()))?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Credential(format!(
                "token exchange failed: {text}"
            )));
        }

        let payload: TokenPayload = response
            .json()
            .await
            .map_err(|e| ProviderError::Credential(e.to_string()))?;

        Ok(AccessToken {
            token: payload.token,
            expires_at: payload.expires_at,
        })
    }
}

/// Caches the current installation token behind a single-flight refresh.
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            slot: Mutex::new(None),
        }
    }

    /// Current token string, refreshing if missing or near expiry.
    ///
    /// The mutex is held across the refresh: exactly one refresh runs at
    /// a time, and a failed refresh is not cached, so the next caller
    /// retries from scratch.
    pub async fn get_token(&self) -> Result<String, ProviderError> {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.is_usable(Utc::now()) {
                return Ok(token.token.clone());
            }
        }

        // A stale token is never reused past its margin.
        *slot = None;
        let fresh = self.source.fetch().await?;
        let token = fresh.token.clone();
        *slot = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl FakeSource {
        fn new(fail_first: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_first,
            })
        }
    }

    #[async_trait]
    impl TokenSource for FakeSource {
        async fn fetch(&self) -> Result<AccessToken, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent callers pile up on the cache mutex.
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            if self.fail_first && n == 0 {
                return Err(ProviderError::Credential("exchange unavailable".into()));
            }
            Ok(AccessToken {
                token: format!("token-{n}"),
                expires_at: Utc::now() + Duration::minutes(60),
            })
        }
    }

    fn cache_with_token(source: Arc<dyn TokenSource>, expires_in: Duration) -> TokenCache {
        TokenCache {
            source,
            slot: Mutex::new(Some(AccessToken {
                token: "stale".to_string(),
                expires_at: Utc::now() + expires_in,
            })),
        }
    }

    #[test]
    fn test_usable_respects_margin() {
        let now = Utc::now();
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(5),
        };
        assert!(!token.is_usable(now));

        let token = AccessToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(token.is_usable(now));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let source = FakeSource::new(false);
        let cache = cache_with_token(source.clone(), Duration::seconds(5));

        let results =
            futures::future::join_all((0..10).map(|_| cache.get_token())).await;

        for result in results {
            assert_eq!(result.unwrap(), "token-0");
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_token_skips_refresh() {
        let source = FakeSource::new(false);
        let cache = cache_with_token(source.clone(), Duration::minutes(30));

        assert_eq!(cache.get_token().await.unwrap(), "stale");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_not_cached() {
        let source = FakeSource::new(true);
        let cache = TokenCache::new(source.clone());

        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, ProviderError::Credential(_)));

        // The failure is surfaced, not stored; the next call retries.
        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
