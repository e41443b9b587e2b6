//! Pre-flight checks before long-running operations.
//!
//! Validates that required tools and credentials are available before
//! starting work that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{MedragError, Result};
use crate::http::env_secret;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The API server needs the vector index key and an embedding provider.
    Serve,
    /// Recovery and chunk previews need yt-dlp.
    FetchTranscripts,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Serve => {
            require_env(crate::vector_store::PINECONE_API_KEY_ENV)?;
            if settings.embedding.provider == EmbeddingProvider::OpenAI {
                require_env("OPENAI_API_KEY")?;
            }
        }
        Operation::FetchTranscripts => {
            check_tool("yt-dlp")?;
        }
    }
    Ok(())
}

fn require_env(name: &str) -> Result<()> {
    match env_secret(name) {
        Some(_) => Ok(()),
        None => Err(MedragError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            name, name
        ))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(MedragError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(MedragError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(MedragError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
