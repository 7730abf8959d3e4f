use crate::config::types::{CacheConfig, Config, CrawlerConfig, LlmConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_cache_config(&config.cache)?;
    validate_llm_config(&config.llm)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.chunk_size < 1 || config.chunk_size > 100 {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be between 1 and 100, got {}",
            config.chunk_size
        )));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be <= 256 (0 = auto), got {}",
            config.workers
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cache directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_llm_config(config: &LlmConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm model cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid llm endpoint: {}", e)))?;

    if let Some(key) = &config.api_key {
        if key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "llm api-key cannot be blank when present".to_string(),
            ));
        }
    }

    Ok(())
}

/// Checks the contact email has a local part and a dotted domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.contains('@') =>
        {
            Ok(())
        }
        _ => Err(ConfigError::Validation(format!(
            "contact_email is not a valid address: '{}'",
            email
        ))),
    }
}
