//! GitHub App authentication and content API access for Pipeweld.
//!
//! This crate contains:
//! - The installation token cache with single-flight refresh
//! - The contents/status API client implementing `ContentProvider`

pub mod auth;
pub mod client;

pub use auth::{AccessToken, AppCredentials, TokenCache, TokenSource};
pub use client::GitHubClient;

/// Default GitHub API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// User agent sent on all outbound requests.
pub(crate) const USER_AGENT: &str = "Pipeweld";
