//! Text-completion service seam
//!
//! Everything that talks to a language model goes through `CompletionClient`
//! so categorization and page selection can be exercised with canned replies.

mod gemini;

use crate::ConfigError;
use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Environment variables consulted for an API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Errors from a completion request
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response had no text")]
    EmptyResponse,
}

/// A service that turns a prompt into text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Resolves the API key from an explicit value or the environment
///
/// Lookup order: `explicit`, then `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
/// Blank values are skipped.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String, ConfigError> {
    resolve_api_key_with(explicit, |name| std::env::var(name).ok())
}

/// Same as `resolve_api_key`, with the environment lookup injected
pub fn resolve_api_key_with<F>(explicit: Option<&str>, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or(ConfigError::MissingApiKey)
}
