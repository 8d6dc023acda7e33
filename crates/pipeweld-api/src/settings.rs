//! Environment-based configuration.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Config file name joined onto virtual pipeline paths when the request
/// does not carry one.
pub const DEFAULT_CONFIG_FILE: &str = "pipeline.yml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing environment variable: {0}")]
    Missing(String),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: String, message: String },
}

/// Runtime settings, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Shared secret for verifying inbound requests.
    pub secret: String,
    /// Listen address.
    pub addr: SocketAddr,
    /// GitHub App identity.
    pub github_app_id: String,
    /// Installation the app acts as.
    pub github_installation_id: String,
    /// PEM-encoded RSA private key of the app.
    pub github_private_key: String,
    /// API base URL; override for GitHub Enterprise.
    pub github_api_url: String,
    /// Upper bound on one resolution call.
    pub resolve_timeout: Duration,
    /// Overwrite `depends_on` on records marked `injectDependencies`.
    pub inject_dependencies: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            secret: require("PIPEWELD_SECRET")?,
            addr: parse_addr("PIPEWELD_ADDR", "0.0.0.0:3000")?,
            github_app_id: require("PIPEWELD_GITHUB_APP_ID")?,
            github_installation_id: require("PIPEWELD_GITHUB_APP_INSTALLATION_ID")?,
            github_private_key: require("PIPEWELD_GITHUB_APP_PRIVATE_KEY")?,
            github_api_url: std::env::var("PIPEWELD_GITHUB_API_URL")
                .unwrap_or_else(|_| pipeweld_github::GITHUB_API_URL.to_string()),
            resolve_timeout: Duration::from_secs(parse_u64(
                "PIPEWELD_RESOLVE_TIMEOUT_SECS",
                30,
            )?),
            inject_dependencies: std::env::var("PIPEWELD_INJECT_DEPENDENCIES")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}

fn require(name: &str) -> Result<String, SettingsError> {
    std::env::var(name).map_err(|_| SettingsError::Missing(name.to_string()))
}

fn parse_addr(name: &str, default: &str) -> Result<SocketAddr, SettingsError> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|e: std::net::AddrParseError| {
        SettingsError::Invalid {
            name: name.to_string(),
            message: e.to_string(),
        }
    })
}

fn parse_u64(name: &str, default: u64) -> Result<u64, SettingsError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: std::num::ParseIntError| SettingsError::Invalid {
                name: name.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}
