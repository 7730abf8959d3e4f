//! Queries over a cached bundle
//!
//! This module provides:
//! - Keyword search over the link leaves of both trees
//! - Model-driven page selection against the rendered tree

mod relevance;

pub use relevance::{build_selection_prompt, parse_selection, select_relevant_pages, RelevantPage};

use crate::cache::CacheBundle;
use crate::tree::{CategorizedTree, NodeKind};
use std::collections::HashSet;
use std::fmt;

/// Characters of page content shown alongside a result
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relevance {
    High,
    Medium,
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

/// A link matching a keyword query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    /// Description of the category the link sits in, when there is one
    pub description: Option<String>,
    pub relevance: Relevance,
}

/// Finds links whose label or URL contains every query term
///
/// The enhanced tree is searched first and its matches rank `High`; the
/// conventional tree then contributes `Medium` matches for URLs not already
/// found. At most `max_results` hits are returned.
pub fn find_links(bundle: &CacheBundle, query: &str, max_results: usize) -> Vec<SearchHit> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() || max_results == 0 {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for (tree, relevance) in [
        (&bundle.enhanced_tree, Relevance::High),
        (&bundle.conventional_tree, Relevance::Medium),
    ] {
        for hit in matching_links(tree, &terms, relevance) {
            if hits.len() >= max_results {
                return hits;
            }
            if seen.insert(hit.url.clone()) {
                hits.push(hit);
            }
        }
    }

    hits
}

fn matching_links(tree: &CategorizedTree, terms: &[String], relevance: Relevance) -> Vec<SearchHit> {
    tree.links()
        .filter_map(|node| {
            let url = node.kind.url()?;
            let haystack = format!("{} {}", node.label, url).to_lowercase();
            if !terms.iter().all(|term| haystack.contains(term.as_str())) {
                return None;
            }

            let description = node
                .parent_id
                .as_deref()
                .and_then(|parent| tree.get(parent))
                .and_then(|parent| match &parent.kind {
                    NodeKind::Category { description } => description.clone(),
                    _ => None,
                });

            Some(SearchHit {
                url: url.to_string(),
                title: node.label.clone(),
                description,
                relevance,
            })
        })
        .collect()
}

/// The first `PREVIEW_CHARS` characters of a page body
pub fn content_preview(body: &str) -> &str {
    match body.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
