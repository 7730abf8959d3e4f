//! HTML parsing for link discovery and readable content
//!
//! This module handles:
//! - Extracting same-domain `(url, anchor text)` pairs from a page
//! - Turning a page into a title plus a markdown-ish body

use crate::crawler::{Link, NO_TEXT};
use crate::url::extract_domain;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Readable content extracted from an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub body: String,
}

/// Elements whose contents never contribute to the readable body
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside", "form",
    "button", "iframe",
];

/// Extracts links from HTML content
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags resolving to the base URL's domain
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links (same page anchors)
/// - Links to other domains
///
/// Fragments are stripped from the resolved URL. The anchor text is trimmed
/// with inner whitespace collapsed; an anchor with no text gets `[No text]`.
///
/// # Example
///
/// ```
/// use doc_atlas::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/docs">Docs</a><a href="https://other.com/">Other</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].url, "https://example.com/docs");
/// assert_eq!(links[0].anchor_text, "Docs");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Link> {
    let document = Html::parse_document(html);
    let base_domain = extract_domain(base_url);
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(href, base_url) else {
            continue;
        };

        if extract_domain(&absolute) != base_domain {
            continue;
        }

        let text = collapse_whitespace(&element.text().collect::<String>());
        let anchor_text = if text.is_empty() {
            NO_TEXT.to_string()
        } else {
            text
        };

        links.push(Link::new(absolute.as_str(), &anchor_text));
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);
    Some(absolute)
}

/// Extracts a title and a readable body from an HTML page
///
/// The body comes from the first of `<main>`, `<article>`, `[role=main]` or
/// `<body>` present. Headings become `#` lines, list items `- ` lines and
/// `<pre>` blocks fenced code. Returns `None` when the page yields neither a
/// title nor any body text.
pub fn extract_readable_content(html: &str) -> Option<ExtractedContent> {
    let document = Html::parse_document(html);
    let title = extract_title(&document);

    let mut blocks = Vec::new();
    if let Some(container) = find_content_root(&document) {
        render_blocks(container, &mut blocks);
    }
    let body = blocks.join("\n\n");

    if title.is_none() && body.is_empty() {
        return None;
    }

    Some(ExtractedContent { title, body })
}

/// Extracts the page title, falling back to the first `<h1>`
fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        document
            .select(&selector)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|s| !s.is_empty())
    })
}

fn find_content_root(document: &Html) -> Option<ElementRef<'_>> {
    ["main", "article", "[role=main]", "body"]
        .iter()
        .find_map(|candidate| {
            let selector = Selector::parse(candidate).ok()?;
            document.select(&selector).next()
        })
}

fn render_blocks(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text = collapse_whitespace(text);
            if !text.is_empty() {
                out.push(text);
            }
            continue;
        }

        let Some(child_element) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            continue;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                push_inline(out, child_element, &format!("{} ", "#".repeat(level)));
            }
            "p" | "dt" | "dd" | "figcaption" | "caption" => push_inline(out, child_element, ""),
            "li" => push_inline(out, child_element, "- "),
            "blockquote" => push_inline(out, child_element, "> "),
            "pre" => {
                let code: String = child_element.text().collect();
                let code = code.trim_matches('\n');
                if !code.trim().is_empty() {
                    out.push(format!("```\n{}\n```", code));
                }
            }
            "tr" => {
                let cells: Vec<String> = child_element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
                    .collect();
                if cells.iter().any(|c| !c.is_empty()) {
                    out.push(format!("| {} |", cells.join(" | ")));
                }
            }
            _ => render_blocks(child_element, out),
        }
    }
}

fn push_inline(out: &mut Vec<String>, element: ElementRef<'_>, prefix: &str) {
    let text = collapse_whitespace(&element.text().collect::<String>());
    if !text.is_empty() {
        out.push(format!("{}{}", prefix, text));
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
