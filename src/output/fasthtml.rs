//! Merged single-file document of every fetched page
//!
//! Layout: a `<project>` wrapper, a table of contents built from the URL path
//! hierarchy, then one `<doc>` section per requested same-domain URL in URL
//! order. Requested pages without cached content get an error section
//! instead; links that were never requested are left out.

use crate::cache::CacheBundle;
use crate::url::domain_of;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use url::Url;

#[derive(Default)]
struct PathNode {
    children: BTreeMap<String, PathNode>,
}

/// Builds the merged document from cached content only; nothing is fetched
///
/// # Arguments
///
/// * `bundle` - The crawl bundle
/// * `requested` - URLs whose content fetch was attempted
pub fn format_fasthtml_document(bundle: &CacheBundle, requested: &[String]) -> String {
    let domain = domain_of(&bundle.base_url).unwrap_or_default();
    let mut doc = format!(
        "<project title=\"{} Link Analysis\" summary='A collection of content from {} pages organized by hierarchy.'>\n\n",
        escape(&domain),
        escape(&domain)
    );

    let mut anchor_texts: HashMap<&str, &str> = HashMap::new();
    for link in &bundle.links {
        anchor_texts
            .entry(link.url.as_str())
            .or_insert(link.anchor_text.as_str());
    }

    let requested: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
    let mut pages: Vec<(&str, &str, Vec<String>)> = Vec::new();
    for url in requested {
        let Ok(parsed) = Url::parse(url) else {
            continue;
        };
        if crate::url::extract_domain(&parsed).as_deref() != Some(domain.as_str()) {
            continue;
        }
        let text = anchor_texts.get(url).copied().unwrap_or("");
        pages.push((url, text, path_segments(&parsed)));
    }

    let mut hierarchy = PathNode::default();
    for (_, _, segments) in &pages {
        let mut level = &mut hierarchy;
        for segment in segments {
            level = level.children.entry(segment.clone()).or_default();
        }
    }

    doc.push_str("# Table of Contents\n\n");
    let mut toc = Vec::new();
    write_hierarchy(&hierarchy, &mut Vec::new(), 0, &mut doc, &mut toc);
    doc.push('\n');

    doc.push_str("## Document Sections\n\n");
    for (section_id, name, indent) in &toc {
        doc.push_str(&format!("{}- [{}](#{})\n", " ".repeat(*indent), name, section_id));
    }
    doc.push_str("\n---\n\n");

    for (url, text, segments) in &pages {
        match bundle.pages.get(*url) {
            Some(record) => {
                let title = if text.trim().is_empty() { "Untitled" } else { *text };
                doc.push_str(&format!("<a id=\"{}\"></a>\n\n", segments.join("_")));
                doc.push_str(&format!(
                    "<doc title=\"{}\" desc=\"Content from {}\">\n\n",
                    escape(title),
                    escape(url)
                ));
                doc.push_str(&record.body);
                doc.push_str("\n</doc>\n\n");
            }
            None => {
                doc.push_str(&format!(
                    "<doc title=\"Error: {}\" desc=\"Failed to fetch content\">\n",
                    escape(url)
                ));
                doc.push_str("No content was retrieved for this page.\n");
                doc.push_str("</doc>\n\n");
            }
        }
    }

    doc.push_str("</project>");
    doc
}

fn path_segments(url: &Url) -> Vec<String> {
    let segments: Vec<String> = url
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if segments.is_empty() {
        vec!["home".to_string()]
    } else {
        segments
    }
}

fn write_hierarchy(
    node: &PathNode,
    prefix: &mut Vec<String>,
    indent: usize,
    doc: &mut String,
    toc: &mut Vec<(String, String, usize)>,
) {
    for (name, child) in &node.children {
        prefix.push(name.clone());
        toc.push((prefix.join("_"), name.clone(), indent));
        doc.push_str(&format!("{}- {}\n", " ".repeat(indent), name));
        write_hierarchy(child, prefix, indent + 2, doc, toc);
        prefix.pop();
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ContentRecord, Link};

    #[test]
    fn test_document_layout() {
        let links = vec![
            Link::new("https://ex.com/docs/intro", "Intro & Overview"),
            Link::new("https://ex.com/docs/missing", "Missing"),
            Link::new("https://other.com/x", "X"),
            Link::new("https://ex.com/docs/intro", "Duplicate"),
        ];
        let requested = vec![
            "https://ex.com/docs/missing".to_string(),
            "https://ex.com/docs/intro".to_string(),
            "https://other.com/x".to_string(),
            "https://ex.com/docs/intro".to_string(),
        ];
        let mut pages = HashMap::new();
        pages.insert(
            "https://ex.com/docs/intro".to_string(),
            ContentRecord {
                url: "https://ex.com/docs/intro".to_string(),
                title: "Intro".to_string(),
                body: "# Intro\n\nHello".to_string(),
            },
        );
        let bundle = CacheBundle {
            base_url: "https://ex.com/".to_string(),
            links,
            pages,
            ..Default::default()
        };

        let doc = format_fasthtml_document(&bundle, &requested);
        assert!(doc.starts_with("<project title=\"ex.com Link Analysis\""));
        assert!(doc.contains("- docs\n  - intro\n  - missing\n"));
        assert!(doc.contains("  - [intro](#docs_intro)\n"));
        assert!(doc.contains("<a id=\"docs_intro\"></a>"));
        assert!(doc.contains("<doc title=\"Intro &amp; Overview\" desc=\"Content from https://ex.com/docs/intro\">\n\n# Intro\n\nHello\n</doc>"));
        assert!(doc.contains("<doc title=\"Error: https://ex.com/docs/missing\""));
        assert!(!doc.contains("other.com"));
        assert_eq!(doc.matches("<doc title=\"Intro").count(), 1);
        assert!(doc.ends_with("</project>"));
    }

    #[test]
    fn test_links_past_page_cap_are_left_out() {
        let links: Vec<Link> = (0..5)
            .map(|i| Link::new(&format!("https://ex.com/page{}", i), &format!("Page {}", i)))
            .collect();
        let requested: Vec<String> = links.iter().take(2).map(|l| l.url.clone()).collect();
        let pages: HashMap<String, ContentRecord> = requested
            .iter()
            .map(|url| {
                let record = ContentRecord {
                    url: url.clone(),
                    title: "Page".to_string(),
                    body: "Body".to_string(),
                };
                (url.clone(), record)
            })
            .collect();
        let bundle = CacheBundle {
            base_url: "https://ex.com/".to_string(),
            links,
            pages,
            ..Default::default()
        };

        let doc = format_fasthtml_document(&bundle, &requested);
        assert_eq!(doc.matches("<doc ").count(), 2);
        assert!(!doc.contains("Error:"));
        assert!(!doc.contains("page2"));
        assert!(!doc.contains("page4"));
    }

    #[test]
    fn test_requested_url_without_anchor_is_untitled() {
        let url = "https://ex.com/from-model".to_string();
        let mut pages = HashMap::new();
        pages.insert(
            url.clone(),
            ContentRecord {
                url: url.clone(),
                title: "Model pick".to_string(),
                body: "Body".to_string(),
            },
        );
        let bundle = CacheBundle {
            base_url: "https://ex.com/".to_string(),
            pages,
            ..Default::default()
        };

        let doc = format_fasthtml_document(&bundle, &[url]);
        assert!(doc.contains("<doc title=\"Untitled\" desc=\"Content from https://ex.com/from-model\">"));
    }
}
