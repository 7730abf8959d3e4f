use serde::Deserialize;

/// Main configuration structure for Doc-Atlas
///
/// Every section is optional in the TOML file; missing sections take their
/// defaults so the CLI can run without any config file at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub cache: CacheConfig,
    pub llm: LlmConfig,
}

/// Content fetching behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of URLs handed to a worker at a time
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,

    /// Maximum in-flight requests inside a single worker
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: usize,

    /// Worker threads; 0 means available parallelism minus one
    pub workers: usize,

    /// Maximum number of pages whose content is fetched per crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3,
            max_concurrent_requests: 8,
            workers: 0,
            max_pages: 30,
            request_timeout_secs: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "DocAtlas".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/doc-atlas/doc-atlas".to_string(),
            contact_email: "crawler@doc-atlas.dev".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// On-disk cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory holding one sub-directory per domain
    pub directory: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: "./cache".to_string(),
        }
    }
}

/// Text-completion service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether the enhanced tree is built with the LLM at all
    pub enabled: bool,

    /// Model name passed to the completion endpoint
    pub model: String,

    /// Base URL of the generative language API
    pub endpoint: String,

    /// API key; falls back to GEMINI_API_KEY then GOOGLE_API_KEY
    #[serde(rename = "api-key")]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
        }
    }
}
