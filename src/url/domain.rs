use url::Url;

/// Extracts the network location (host plus explicit port) from a URL
///
/// The host is lowercased. A port is only included when it is not the
/// scheme's default, so `https://example.com:443/` and `https://example.com/`
/// share a domain while a local test server on `127.0.0.1:8080` keeps its port.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use doc_atlas::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/docs").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Parses a URL string and extracts its domain in one step
pub fn domain_of(url_str: &str) -> Option<String> {
    Url::parse(url_str).ok().as_ref().and_then(extract_domain)
}

/// Converts a domain into a directory-safe name
///
/// Dots and port separators both become underscores:
/// `docs.example.com` -> `docs_example_com`, `127.0.0.1:8080` -> `127_0_0_1_8080`.
pub fn domain_dir_name(domain: &str) -> String {
    domain
        .chars()
        .map(|c| if c == '.' || c == ':' { '_' } else { c })
        .collect()
}
