//! Console renderers for links, trees and query results

use super::OutputResult;
use crate::cache::CacheBundle;
use crate::crawler::Link;
use crate::search::{content_preview, RelevantPage, SearchHit};
use crate::tree::{CategorizedTree, NodeKind, TreeNode};
use std::io::Write;

const MAX_TEXT_WIDTH: usize = 60;

/// Writes links as an aligned two-column table
pub fn write_links_table(out: &mut impl Write, links: &[Link]) -> OutputResult<()> {
    let url_width = links
        .iter()
        .map(|link| link.url.chars().count())
        .max()
        .unwrap_or(0)
        .max("URL".len());

    writeln!(out, "{:>4}  {:<width$}  Text", "#", "URL", width = url_width)?;
    writeln!(out, "{:>4}  {}  {}", "", "-".repeat(url_width), "-".repeat(4))?;
    for (i, link) in links.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:<width$}  {}",
            i + 1,
            link.url,
            truncate(&link.anchor_text, MAX_TEXT_WIDTH),
            width = url_width
        )?;
    }
    writeln!(out, "\n{} links", links.len())?;
    Ok(())
}

/// Writes one `text: url` line per link
pub fn write_links_text(out: &mut impl Write, links: &[Link]) -> OutputResult<()> {
    for link in links {
        writeln!(out, "{}: {}", link.anchor_text, link.url)?;
    }
    Ok(())
}

/// Writes a tree with box-drawing branches
pub fn write_tree(out: &mut impl Write, tree: &CategorizedTree) -> OutputResult<()> {
    let Some(root) = tree.root() else {
        writeln!(out, "(empty tree)")?;
        return Ok(());
    };

    writeln!(out, "{}", node_line(root))?;
    write_children(out, tree, root, "")
}

fn write_children(
    out: &mut impl Write,
    tree: &CategorizedTree,
    node: &TreeNode,
    prefix: &str,
) -> OutputResult<()> {
    let children = tree.children_of(&node.id)?;
    let count = children.len();

    for (i, child) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        writeln!(out, "{}{}{}", prefix, branch, node_line(child))?;

        let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
        write_children(out, tree, child, &next)?;
    }
    Ok(())
}

fn node_line(node: &TreeNode) -> String {
    match &node.kind {
        NodeKind::Root => node.label.clone(),
        NodeKind::Category { .. } => format!("{}/", node.label),
        NodeKind::Link { url, importance } => match importance {
            Some(score) => format!("{} ({}) [{}]", node.label, url, score),
            None => format!("{} ({})", node.label, url),
        },
    }
}

/// Writes keyword search hits with a preview of cached content
pub fn write_search_hits(
    out: &mut impl Write,
    hits: &[SearchHit],
    bundle: &CacheBundle,
    query: &str,
) -> OutputResult<()> {
    if hits.is_empty() {
        writeln!(out, "No pages matched '{}'", query)?;
        return Ok(());
    }

    writeln!(out, "Found {} pages matching '{}':\n", hits.len(), query)?;
    for (i, hit) in hits.iter().enumerate() {
        writeln!(out, "{}. {} [{}]", i + 1, hit.title, hit.relevance)?;
        writeln!(out, "   {}", hit.url)?;
        if let Some(description) = &hit.description {
            writeln!(out, "   {}", description)?;
        }
        write_preview(out, bundle, &hit.url)?;
    }
    Ok(())
}

/// Writes the pages a model selected, joined with cached content
pub fn write_relevant_pages(
    out: &mut impl Write,
    pages: &[RelevantPage],
    bundle: &CacheBundle,
    query: &str,
) -> OutputResult<()> {
    if pages.is_empty() {
        writeln!(out, "No relevant pages found for '{}'", query)?;
        return Ok(());
    }

    writeln!(out, "Relevant pages for '{}':\n", query)?;
    for (i, page) in pages.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, page.url)?;
        if !page.reason.is_empty() {
            writeln!(out, "   Reason: {}", page.reason)?;
        }
        write_preview(out, bundle, &page.url)?;
    }
    Ok(())
}

fn write_preview(out: &mut impl Write, bundle: &CacheBundle, url: &str) -> OutputResult<()> {
    match bundle.pages.get(url) {
        Some(record) => {
            writeln!(out, "   --- {} ---", record.title)?;
            for line in content_preview(&record.body).lines() {
                writeln!(out, "   {}", line)?;
            }
        }
        None => writeln!(out, "   (not cached)")?,
    }
    writeln!(out)?;
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::ContentRecord;
    use crate::search::Relevance;
    use crate::tree::categorize_by_structure;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> OutputResult<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_links_table_alignment() {
        let links = vec![
            Link::new("https://ex.com/a", "A"),
            Link::new("https://ex.com/longer", "Longer"),
        ];
        let text = render(|out| write_links_table(out, &links));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "   #  URL                    Text");
        assert_eq!(lines[2], "   1  https://ex.com/a       A");
        assert_eq!(lines[3], "   2  https://ex.com/longer  Longer");
        assert!(text.ends_with("2 links\n"));
    }

    #[test]
    fn test_links_text() {
        let links = vec![Link::new("https://ex.com/a", "A")];
        assert_eq!(render(|out| write_links_text(out, &links)), "A: https://ex.com/a\n");
    }

    #[test]
    fn test_tree_branches() {
        let links = vec![
            Link::new("https://ex.com/docs/a", "A"),
            Link::new("https://ex.com/docs/b", "B"),
            Link::new("https://ex.com/blog", "Blog"),
        ];
        let tree = categorize_by_structure(&links, "https://ex.com");
        let text = render(|out| write_tree(out, &tree));

        let expected = "\
Website Structure
└── Main Site (ex.com)/
    ├── Blog/
    │   └── Blog (https://ex.com/blog)
    └── Docs/
        ├── A (https://ex.com/docs/a)
        └── B (https://ex.com/docs/b)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_tree() {
        let tree = CategorizedTree::new();
        assert_eq!(render(|out| write_tree(out, &tree)), "(empty tree)\n");
    }

    #[test]
    fn test_search_hits_with_preview() {
        let mut bundle = CacheBundle::default();
        bundle.pages.insert(
            "https://ex.com/a".to_string(),
            ContentRecord {
                url: "https://ex.com/a".to_string(),
                title: "Page A".to_string(),
                body: "First line\nSecond line".to_string(),
            },
        );
        let hits = vec![
            SearchHit {
                url: "https://ex.com/a".to_string(),
                title: "A".to_string(),
                description: Some("Docs".to_string()),
                relevance: Relevance::High,
            },
            SearchHit {
                url: "https://ex.com/b".to_string(),
                title: "B".to_string(),
                description: None,
                relevance: Relevance::Medium,
            },
        ];

        let text = render(|out| write_search_hits(out, &hits, &bundle, "a"));
        assert!(text.contains("1. A [high]\n   https://ex.com/a\n   Docs\n   --- Page A ---\n   First line\n   Second line\n"));
        assert!(text.contains("2. B [medium]\n   https://ex.com/b\n   (not cached)\n"));
    }

    #[test]
    fn test_no_relevant_pages() {
        let text = render(|out| write_relevant_pages(out, &[], &CacheBundle::default(), "x"));
        assert_eq!(text, "No relevant pages found for 'x'\n");
    }
}
