//! Crawl coordinator - end-to-end crawl orchestration
//!
//! A crawl runs these steps for a single root URL:
//! - Return the cached bundle when the domain is already cached
//! - Fetch the root page and extract its same-domain links
//! - Build the conventional tree and the enhanced tree
//! - Fetch readable content for the pages of both trees
//! - Save the bundle to the cache, with a merged document of the fetched pages
//!
//! Only a failed root fetch or a root page without base-domain links ends a
//! crawl early, and both are reported through `CrawlReport::error`.

use crate::cache::{CacheBundle, CacheLayer};
use crate::config::Config;
use crate::crawler::{
    build_http_client, extract_links, fetch_webpage, ContentFetcher, FetchStatistics,
    HttpPageSource, PoolConfig,
};
use crate::output::format_fasthtml_document;
use crate::tree::{base_domain_links, categorize_by_structure, CategorizedTree, SemanticCategorizer};
use crate::url::{add_scheme_if_needed, extract_domain, parse_target};
use crate::{AtlasError, UrlError};
use reqwest::Client;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// The trees, links and page content; empty when `error` is set
    pub bundle: CacheBundle,

    /// Domain the crawl was keyed on
    pub domain: String,

    /// Content fetch counters, absent for cache hits and failed crawls
    pub stats: Option<FetchStatistics>,

    /// Whether the bundle came from the cache
    pub from_cache: bool,

    /// Directory the bundle was saved to or loaded from
    pub cache_dir: Option<PathBuf>,

    /// Why the crawl stopped early
    pub error: Option<String>,
}

impl CrawlReport {
    fn failed(domain: &str, error: String) -> Self {
        tracing::error!("{}", error);
        Self {
            domain: domain.to_string(),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    cache: CacheLayer,
    semantic: Option<SemanticCategorizer>,
    fetcher: ContentFetcher,
}

impl Coordinator {
    /// Creates a coordinator with HTTP page sources and no semantic categorizer
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(AtlasError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, AtlasError> {
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let client = build_http_client(&config.user_agent, timeout)?;
        let cache = CacheLayer::new(&config.cache.directory);
        let fetcher = ContentFetcher::new(
            PoolConfig::from_crawler(&config.crawler),
            HttpPageSource::factory(config.user_agent.clone(), &config.crawler),
        );

        Ok(Self {
            config,
            client,
            cache,
            semantic: None,
            fetcher,
        })
    }

    /// Builds the enhanced tree with a model instead of copying the conventional one
    pub fn with_semantic(mut self, semantic: SemanticCategorizer) -> Self {
        self.semantic = Some(semantic);
        self
    }

    pub fn with_content_fetcher(mut self, fetcher: ContentFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_cache(mut self, cache: CacheLayer) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    /// Crawls a site, or loads it from the cache unless `refresh` is set
    ///
    /// Never fails: problems that stop the crawl are reported in
    /// `CrawlReport::error` with an empty bundle.
    pub async fn crawl(&self, url: &str, refresh: bool) -> CrawlReport {
        let target = match parse_target(&add_scheme_if_needed(url)) {
            Ok(target) => target,
            Err(e) => return CrawlReport::failed("", format!("Invalid URL {}: {}", url, e)),
        };
        let domain = match extract_domain(&target) {
            Some(domain) => domain,
            None => return CrawlReport::failed("", UrlError::MissingDomain.to_string()),
        };
        let base_url = target.to_string();

        if !refresh && self.cache.is_cached(&domain) {
            match self.cache.load(&domain) {
                Ok(bundle) => {
                    tracing::info!("Using cached data for {}", domain);
                    return CrawlReport {
                        bundle,
                        cache_dir: Some(self.cache.paths_for(&domain).dir),
                        domain,
                        from_cache: true,
                        ..Default::default()
                    };
                }
                Err(e) => tracing::warn!("Ignoring unreadable cache for {}: {}", domain, e),
            }
        }

        tracing::info!("Fetching {}", base_url);
        let html = match fetch_webpage(&self.client, &base_url).await {
            Ok(html) => html,
            Err(e) => {
                return CrawlReport::failed(&domain, format!("Error fetching content: {}", e))
            }
        };

        let links = extract_links(&html, &target);
        tracing::info!("Extracted {} links from {}", links.len(), base_url);
        if base_domain_links(&links, &base_url).is_empty() {
            let error = AtlasError::NoBaseDomainLinks {
                domain: domain.clone(),
            };
            return CrawlReport::failed(&domain, error.to_string());
        }

        let conventional_tree = categorize_by_structure(&links, &base_url);
        let enhanced_tree = match &self.semantic {
            Some(semantic) => semantic.categorize_with_llm(&links, &base_url).await,
            None => conventional_tree.clone(),
        };

        let urls = collect_page_urls(
            &[&conventional_tree, &enhanced_tree],
            self.config.crawler.max_pages,
        );
        let (pages, stats) = self.fetcher.fetch_all_with_stats(&urls).await;

        let bundle = CacheBundle {
            base_url,
            links,
            conventional_tree,
            enhanced_tree,
            pages,
        };

        let cache_dir = match self.cache.save(&domain, &bundle) {
            Ok(paths) => {
                let document = format_fasthtml_document(&bundle, &urls);
                if let Err(e) = self.cache.write_document(&domain, &document) {
                    tracing::warn!("Failed to write merged document for {}: {}", domain, e);
                }
                Some(paths.dir)
            }
            Err(e) => {
                tracing::warn!("Failed to cache {}: {}", domain, e);
                None
            }
        };

        CrawlReport {
            bundle,
            domain,
            stats: Some(stats),
            from_cache: false,
            cache_dir,
            error: None,
        }
    }
}

/// Link URLs from every tree, sorted, deduplicated and capped at `max_pages`
pub fn collect_page_urls(trees: &[&CategorizedTree], max_pages: usize) -> Vec<String> {
    let unique: BTreeSet<&str> = trees.iter().flat_map(|tree| tree.urls()).collect();
    if unique.len() > max_pages {
        tracing::info!(
            "Limiting content fetch to {} of {} pages",
            max_pages,
            unique.len()
        );
    }
    unique
        .into_iter()
        .take(max_pages)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Link;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.cache.directory = dir.path().to_string_lossy().into_owned();
        config.crawler.request_timeout_secs = 5;
        config
    }

    #[test]
    fn test_collect_page_urls() {
        let a = categorize_by_structure(
            &[
                Link::new("https://ex.com/b", "B"),
                Link::new("https://ex.com/a", "A"),
            ],
            "https://ex.com",
        );
        let b = categorize_by_structure(
            &[
                Link::new("https://ex.com/c", "C"),
                Link::new("https://ex.com/a", "A"),
            ],
            "https://ex.com",
        );

        assert_eq!(
            collect_page_urls(&[&a, &b], 10),
            vec!["https://ex.com/a", "https://ex.com/b", "https://ex.com/c"]
        );
        assert_eq!(collect_page_urls(&[&a, &b], 2).len(), 2);
        assert!(collect_page_urls(&[&a], 0).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(test_config(&dir)).unwrap();

        let report = coordinator.crawl("http://exa mple.com/", false).await;
        assert!(!report.is_ok());
        assert!(report.bundle.links.is_empty());
    }

    #[tokio::test]
    async fn test_root_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(test_config(&dir)).unwrap();
        let report = coordinator.crawl(&server.uri(), false).await;

        let error = report.error.unwrap();
        assert!(error.starts_with("Error fetching content:"));
        assert!(report.bundle.conventional_tree.is_empty());
        assert!(report.stats.is_none());
    }
}
