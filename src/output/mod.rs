//! Output module for rendering crawl results
//!
//! This module handles:
//! - The markdown tree document and merged page document written to the cache
//! - Console rendering of links, trees and query results
//! - Fetch statistics and crawl summaries

mod console;
mod fasthtml;
mod markdown;
pub mod stats;

pub use console::{
    write_links_table, write_links_text, write_relevant_pages, write_search_hits, write_tree,
};
pub use fasthtml::format_fasthtml_document;
pub use markdown::format_tree_document;
pub use stats::{write_report_summary, write_statistics};

use crate::tree::TreeError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
