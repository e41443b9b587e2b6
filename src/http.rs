//! HTTP client construction shared by the remote collaborators.

use crate::error::{MedragError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for collaborator requests (2 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Build a reqwest client with the given timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("medrag/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(MedragError::Http)
}

/// Create an OpenAI client whose requests share the given timeout.
pub fn openai_client(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = build_client(timeout)?;
    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

/// Read a secret from the environment, treating empty values as unset.
pub fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
