//! On-disk formats of the cached artifacts

use crate::cache::CacheError;
use crate::crawler::{ContentRecord, Link, NO_TEXT};
use crate::tree::{CategorizedTree, SerializedTree};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Everything a crawl produces for one domain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheBundle {
    pub base_url: String,
    pub links: Vec<Link>,
    pub conventional_tree: CategorizedTree,
    pub enhanced_tree: CategorizedTree,
    pub pages: HashMap<String, ContentRecord>,
}

/// `tree_structure.json`
#[derive(Debug, Serialize, Deserialize)]
pub struct TreeDocument {
    pub conventional_tree: SerializedTree,
    pub enhanced_tree: SerializedTree,
}

/// One entry of `pages_content.json`
#[derive(Debug, Serialize, Deserialize)]
pub struct PageEntry {
    pub title: String,
    pub content: String,
}

impl CacheBundle {
    pub fn tree_document(&self) -> TreeDocument {
        TreeDocument {
            conventional_tree: self.conventional_tree.serialize(),
            enhanced_tree: self.enhanced_tree.serialize(),
        }
    }

    /// Pages keyed by URL in sorted order, so the file is stable across runs
    pub fn page_entries(&self) -> BTreeMap<&str, PageEntry> {
        self.pages
            .values()
            .map(|record| {
                (
                    record.url.as_str(),
                    PageEntry {
                        title: record.title.clone(),
                        content: record.body.clone(),
                    },
                )
            })
            .collect()
    }
}

pub fn trees_from_document(
    document: &TreeDocument,
) -> Result<(CategorizedTree, CategorizedTree), CacheError> {
    Ok((
        CategorizedTree::from_serialized(&document.conventional_tree)?,
        CategorizedTree::from_serialized(&document.enhanced_tree)?,
    ))
}

pub fn pages_from_entries(entries: BTreeMap<String, PageEntry>) -> HashMap<String, ContentRecord> {
    entries
        .into_iter()
        .map(|(url, entry)| {
            let record = ContentRecord {
                url: url.clone(),
                title: entry.title,
                body: entry.content,
            };
            (url, record)
        })
        .collect()
}

/// Renders `extracted_links.txt`: `# ` header lines, then `url | text` lines
pub fn format_links_file(base_url: &str, links: &[Link]) -> String {
    let mut out = format!("# URL: {}\n# Extracted Links: {}\n\n", base_url, links.len());
    for link in links {
        out.push_str(&format!("{} | {}\n", link.url, link.anchor_text));
    }
    out
}

/// Parses `extracted_links.txt`, returning the base URL from the header and the links
///
/// A line without a ` | ` separator is a bare URL with no anchor text.
pub fn parse_links_file(text: &str) -> (Option<String>, Vec<Link>) {
    let mut base_url = None;
    let mut links = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix("# ") {
            if let Some(url) = header.strip_prefix("URL: ") {
                base_url = Some(url.trim().to_string());
            }
            continue;
        }

        let link = match line.split_once(" | ") {
            Some((url, text)) => Link::new(url.trim(), text),
            None => Link::new(line.trim(), NO_TEXT),
        };
        links.push(link);
    }

    (base_url, links)
}
