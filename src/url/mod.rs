//! URL handling module for Doc-Atlas
//!
//! This module provides domain extraction, input validation, and the path
//! helpers the categorizers use to group links.

mod domain;

use crate::{UrlError, UrlResult};
use url::Url;

pub use domain::{domain_dir_name, domain_of, extract_domain};

/// Returns true when the string parses as a URL with both a scheme and a host
///
/// # Examples
///
/// ```
/// use doc_atlas::url::validate_url;
///
/// assert!(validate_url("https://example.com/docs"));
/// assert!(!validate_url("example.com/docs"));
/// assert!(!validate_url("mailto:someone@example.com"));
/// ```
pub fn validate_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| !parsed.scheme().is_empty() && parsed.host_str().is_some())
        .unwrap_or(false)
}

/// Prepends `https://` when the input has no scheme
pub fn add_scheme_if_needed(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Parses a crawl target, requiring an HTTP(S) URL with a host
pub fn parse_target(url: &str) -> UrlResult<Url> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::InvalidScheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(parsed)
}

/// Returns the URL's path, or `/` when it is empty
pub fn path_or_root(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Returns the first path segment of a path, or `home` for the root
///
/// # Examples
///
/// ```
/// use doc_atlas::url::first_path_segment;
///
/// assert_eq!(first_path_segment("/docs/intro"), "docs");
/// assert_eq!(first_path_segment("/"), "home");
/// assert_eq!(first_path_segment(""), "home");
/// ```
pub fn first_path_segment(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("home")
        .to_string()
}
