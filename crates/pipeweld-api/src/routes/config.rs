//! Config extension endpoint.
//!
//! `POST /` receives a resolution request from the build orchestrator,
//! verified with the shared secret, and answers with the flattened
//! pipeline document.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::info;

use pipeweld_core::{ProviderError, Repo};
use pipeweld_resolver::{ResolveError, publish};

use crate::AppState;
use crate::error::ApiError;
use crate::settings::DEFAULT_CONFIG_FILE;

/// Inbound request from the build orchestrator.
#[derive(Debug, Deserialize)]
pub struct ConfigRequest {
    pub repo: RepoInfo,
    pub build: BuildInfo,
}

#[derive(Debug, Deserialize)]
pub struct RepoInfo {
    pub namespace: String,
    pub name: String,
    #[serde(default, rename = "config_path")]
    pub config: String,
    #[serde(default, rename = "git_http_url")]
    pub http_url: String,
}

#[derive(Debug, Deserialize)]
pub struct BuildInfo {
    /// Commit the build runs against.
    pub after: String,
}

/// Resolved configuration returned to the orchestrator.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub data: String,
}

pub async fn resolve_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ConfigResponse>, ApiError> {
    let signature = headers.get("Signature").and_then(|v| v.to_str().ok());
    if !verify_signature(&state.settings.secret, &body, signature) {
        return Err(ApiError::Unauthorized(
            "invalid request signature".to_string(),
        ));
    }

    let request: ConfigRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))?;

    let repo = Repo::new(
        request.repo.namespace,
        request.repo.name,
        request.repo.http_url,
    );
    let commit = request.build.after;
    let config_file = if request.repo.config.is_empty() {
        DEFAULT_CONFIG_FILE.to_string()
    } else {
        request.repo.config
    };

    info!(
        repo = %format!("{}/{}", repo.namespace, repo.name),
        commit = %commit,
        config = %config_file,
        "Resolving pipeline configuration"
    );

    let root = state
        .provider
        .fetch(&repo, &config_file, &commit)
        .await
        .map_err(|e| match e {
            ProviderError::NotFound(path) => ApiError::NotFound(format!("{path} not found")),
            other => ApiError::Internal(other.to_string()),
        })?;
    let root = String::from_utf8(root.to_vec())
        .map_err(|e| ApiError::BadRequest(format!("config file is not UTF-8: {e}")))?;

    let resolution = match tokio::time::timeout(
        state.settings.resolve_timeout,
        state.resolver.resolve(&root, &repo, &commit, &config_file),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => return Err(ResolveError::Timeout.into()),
    };

    let document = resolution
        .document()
        .map_err(|e| ApiError::Internal(format!("failed to encode document: {e}")))?;

    // Statuses go out in the background; the response does not wait on
    // them.
    publish(state.provider.clone(), repo, commit, resolution.statuses);

    Ok(Json(ConfigResponse { data: document }))
}

/// Verify the shared-secret HMAC over the raw request body.
fn verify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> bool {
    let Some(signature) = signature else {
        return false;
    };

    let Ok(sig_bytes) = hex::decode(signature.trim_start_matches("sha256=")) else {
        return false;
    };

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take any size key");
    mac.update(body);

    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_verify_signature_accepts_valid() {
        let body = br#"{"repo": {}}"#;
        let signature = sign("secret", body);
        assert!(verify_signature("secret", body, Some(&signature)));
        assert!(verify_signature(
            "secret",
            body,
            Some(&format!("sha256={signature}"))
        ));
    }

    #[test]
    fn test_verify_signature_rejects_bad_or_missing() {
        let body = br#"{"repo": {}}"#;
        let signature = sign("other-secret", body);
        assert!(!verify_signature("secret", body, Some(&signature)));
        assert!(!verify_signature("secret", body, None));
        assert!(!verify_signature("secret", body, Some("not-hex")));
    }

    #[test]
    fn test_request_deserializes_protocol_fields() {
        let raw = r#"{
            "repo": {
                "namespace": "acme",
                "name": "monorepo",
                "config_path": "ci.yml",
                "git_http_url": "https://github.com/acme/monorepo"
            },
            "build": {"after": "abc123"}
        }"#;

        let request: ConfigRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.repo.namespace, "acme");
        assert_eq!(request.repo.config, "ci.yml");
        assert_eq!(request.repo.http_url, "https://github.com/acme/monorepo");
        assert_eq!(request.build.after, "abc123");
    }

    #[test]
    fn test_request_defaults_optional_fields() {
        let raw = r#"{
            "repo": {"namespace": "acme", "name": "monorepo"},
            "build": {"after": "abc123"}
        }"#;

        let request: ConfigRequest = serde_json::from_str(raw).unwrap();
        assert!(request.repo.config.is_empty());
        assert!(request.repo.http_url.is_empty());
    }
}
