//! Doc-Atlas: a documentation site mapper
//!
//! This crate crawls a site's internal link graph, organizes the links into a
//! URL-structure tree and an LLM-categorized tree, fetches readable content for
//! every page with a bounded worker pool, and caches the whole bundle per domain
//! so later queries never have to re-fetch.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod llm;
pub mod output;
pub mod search;
pub mod tree;
pub mod url;

use thiserror::Error;

/// Main error type for Doc-Atlas operations
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Tree error: {0}")]
    Tree(#[from] tree::TreeError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("LLM error: {0}")]
    Llm(#[from] llm::LlmError),

    #[error("No links found for base domain: {domain}")]
    NoBaseDomainLinks { domain: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No LLM API key: pass one explicitly or set GEMINI_API_KEY or GOOGLE_API_KEY")]
    MissingApiKey,
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Doc-Atlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::{CacheBundle, CacheLayer};
pub use config::Config;
pub use crawler::{ContentFetcher, ContentRecord, Coordinator, CrawlReport, Link};
pub use tree::{categorize_by_structure, CategorizedTree, NodeKind, SemanticCategorizer};
pub use url::{extract_domain, validate_url};
