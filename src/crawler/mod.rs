//! Crawler module for page fetching and processing
//!
//! This module contains the crawl pipeline, including:
//! - HTTP fetching of the root page and of every linked page
//! - HTML parsing for links and readable content
//! - The bounded worker pool for concurrent content fetching
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod pool;

pub use coordinator::{collect_page_urls, Coordinator, CrawlReport};
pub use fetcher::{
    build_http_client, fetch_url, fetch_webpage, FetchResult, HttpPageSource, PageSource,
    SourceFactory,
};
pub use parser::{extract_links, extract_readable_content, ExtractedContent};
pub use pool::{
    default_worker_count, ContentFetcher, FetchStatistics, PoolConfig, DEFAULT_CHUNK_SIZE,
    DEFAULT_MAX_CONCURRENT,
};

use serde::{Deserialize, Serialize};

/// Anchor text recorded for links whose anchor has no text
pub const NO_TEXT: &str = "[No text]";

/// A hyperlink found on the root page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub anchor_text: String,
}

impl Link {
    pub fn new(url: &str, anchor_text: &str) -> Self {
        Self {
            url: url.to_string(),
            anchor_text: anchor_text.to_string(),
        }
    }
}

/// Readable content fetched for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub url: String,
    pub title: String,
    pub body: String,
}
