//! URL-structure categorization
//!
//! Groups same-domain links by the first segment of their path. The result is
//! a pure function of the input: the same links in the same order always give
//! the same tree, ids included.

use crate::crawler::{Link, NO_TEXT};
use crate::tree::store::{CategorizedTree, NodeKind};
use crate::url::{domain_of, first_path_segment};
use std::collections::{BTreeMap, HashSet};
use url::Url;

pub const STRUCTURE_ROOT_LABEL: &str = "Website Structure";
pub const MAIN_CATEGORY_ID: &str = "category_main_site";

/// A link after domain grouping, with its parsed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedLink {
    pub url: String,
    pub text: String,
    pub path: String,
}

/// Groups links by network location, deduplicating by URL within each domain
///
/// The first occurrence of a URL wins. Links that do not parse are dropped.
pub fn group_by_domain(links: &[Link]) -> BTreeMap<String, Vec<GroupedLink>> {
    let mut groups: BTreeMap<String, Vec<GroupedLink>> = BTreeMap::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for link in links {
        if !seen.insert(link.url.as_str()) {
            continue;
        }
        let Ok(parsed) = Url::parse(&link.url) else {
            continue;
        };
        let Some(domain) = crate::url::extract_domain(&parsed) else {
            continue;
        };

        groups.entry(domain).or_default().push(GroupedLink {
            url: link.url.clone(),
            text: link.anchor_text.clone(),
            path: crate::url::path_or_root(&parsed),
        });
    }

    groups
}

/// Links belonging to the base URL's domain, in first-seen order
pub fn base_domain_links(links: &[Link], base_url: &str) -> Vec<GroupedLink> {
    let Some(base_domain) = domain_of(base_url) else {
        return Vec::new();
    };
    group_by_domain(links)
        .remove(&base_domain)
        .unwrap_or_default()
}

/// Display label for a link: its anchor text, or the URL when there is none
pub fn link_label(text: &str, url: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == NO_TEXT {
        url.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Human label for a first path segment: `home` -> `Homepage`,
/// `getting-started` -> `Getting started`
pub fn path_label(segment: &str) -> String {
    if segment == "home" {
        return "Homepage".to_string();
    }

    let mut chars = segment.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    capitalized.replace(['-', '_'], " ")
}

/// Builds the conventional tree from the URL structure of same-domain links
///
/// Layout:
/// - root `Website Structure`
///   - `Main Site (<domain>)`
///     - one category per first path segment, sorted by segment
///       - one link per unique URL, in first-seen order
///
/// Links on other domains are ignored. An empty input still yields the root
/// and main-site nodes.
///
/// # Arguments
///
/// * `links` - Links extracted from the root page
/// * `base_url` - The crawled URL; its domain selects which links are kept
pub fn categorize_by_structure(links: &[Link], base_url: &str) -> CategorizedTree {
    match build_structure_tree(links, base_url) {
        Ok(tree) => tree,
        Err(e) => {
            // Ids derive from unique segments and indices
            tracing::error!("Failed to build structure tree for {}: {}", base_url, e);
            CategorizedTree::with_root(STRUCTURE_ROOT_LABEL)
        }
    }
}

fn build_structure_tree(
    links: &[Link],
    base_url: &str,
) -> Result<CategorizedTree, crate::tree::TreeError> {
    let base_domain = domain_of(base_url).unwrap_or_default();
    let mut tree = CategorizedTree::with_root(STRUCTURE_ROOT_LABEL);

    tree.create_node(
        &format!("Main Site ({})", base_domain),
        MAIN_CATEGORY_ID,
        Some("root"),
        NodeKind::Category { description: None },
    )?;

    let mut by_segment: BTreeMap<String, Vec<GroupedLink>> = BTreeMap::new();
    for link in base_domain_links(links, base_url) {
        by_segment
            .entry(first_path_segment(&link.path))
            .or_default()
            .push(link);
    }

    for (segment, group) in by_segment {
        let group_id = format!("{}/path_{}", MAIN_CATEGORY_ID, segment);
        tree.create_node(
            &path_label(&segment),
            &group_id,
            Some(MAIN_CATEGORY_ID),
            NodeKind::Category { description: None },
        )?;

        for (index, link) in group.into_iter().enumerate() {
            tree.create_node(
                &link_label(&link.text, &link.url),
                &format!("{}/link_{}", group_id, index),
                Some(&group_id),
                NodeKind::Link {
                    url: link.url,
                    importance: None,
                },
            )?;
        }
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str, text: &str) -> Link {
        Link::new(url, text)
    }

    fn child_labels(tree: &CategorizedTree, id: &str) -> Vec<String> {
        tree.children_of(id)
            .unwrap()
            .into_iter()
            .map(|n| n.label.clone())
            .collect()
    }

    #[test]
    fn test_groups_by_first_segment() {
        let links = vec![
            link("https://ex.com/docs/a", "A"),
            link("https://ex.com/docs/b", "B"),
            link("https://ex.com/blog", "Blog"),
            link("https://other.com/x", "X"),
        ];
        let tree = categorize_by_structure(&links, "https://ex.com");

        assert_eq!(tree.get("root").unwrap().label, "Website Structure");
        assert_eq!(child_labels(&tree, "root"), vec!["Main Site (ex.com)"]);
        assert_eq!(child_labels(&tree, MAIN_CATEGORY_ID), vec!["Blog", "Docs"]);

        let docs_id = format!("{}/path_docs", MAIN_CATEGORY_ID);
        assert_eq!(child_labels(&tree, &docs_id), vec!["A", "B"]);
        let blog_id = format!("{}/path_blog", MAIN_CATEGORY_ID);
        assert_eq!(child_labels(&tree, &blog_id), vec!["Blog"]);

        assert!(!tree.urls().contains(&"https://other.com/x"));
    }

    #[test]
    fn test_empty_links_gives_skeleton() {
        let tree = categorize_by_structure(&[], "https://ex.com");
        assert_eq!(tree.len(), 2);
        assert!(tree.children_of(MAIN_CATEGORY_ID).unwrap().is_empty());
    }

    #[test]
    fn test_root_path_becomes_homepage() {
        let links = vec![link("https://ex.com/", "Home"), link("https://ex.com", "Top")];
        let tree = categorize_by_structure(&links, "https://ex.com");
        let groups = child_labels(&tree, MAIN_CATEGORY_ID);
        assert_eq!(groups, vec!["Homepage"]);
    }

    #[test]
    fn test_duplicates_first_occurrence_wins() {
        let links = vec![
            link("https://ex.com/docs/a", "First"),
            link("https://ex.com/docs/a", "Second"),
        ];
        let tree = categorize_by_structure(&links, "https://ex.com");
        let docs_id = format!("{}/path_docs", MAIN_CATEGORY_ID);
        assert_eq!(child_labels(&tree, &docs_id), vec!["First"]);
    }

    #[test]
    fn test_missing_text_uses_url() {
        let links = vec![
            link("https://ex.com/docs/a", NO_TEXT),
            link("https://ex.com/docs/b", "  "),
        ];
        let tree = categorize_by_structure(&links, "https://ex.com");
        let docs_id = format!("{}/path_docs", MAIN_CATEGORY_ID);
        assert_eq!(
            child_labels(&tree, &docs_id),
            vec!["https://ex.com/docs/a", "https://ex.com/docs/b"]
        );
    }

    #[test]
    fn test_deterministic() {
        let links = vec![
            link("https://ex.com/guides/install", "Install"),
            link("https://ex.com/api/v1", "API"),
            link("https://ex.com/guides/usage", "Usage"),
        ];
        let first = categorize_by_structure(&links, "https://ex.com");
        let second = categorize_by_structure(&links, "https://ex.com");
        assert_eq!(first, second);
        assert_eq!(first.serialize(), second.serialize());
    }

    #[test]
    fn test_segment_that_looks_like_link_id_does_not_collide() {
        let links = vec![
            link("https://ex.com/docs/a", "A"),
            link("https://ex.com/docs_link_0", "Tricky"),
        ];
        let tree = categorize_by_structure(&links, "https://ex.com");
        assert_eq!(tree.urls().len(), 2);
    }

    #[test]
    fn test_path_label() {
        assert_eq!(path_label("home"), "Homepage");
        assert_eq!(path_label("getting-started"), "Getting started");
        assert_eq!(path_label("api_reference"), "Api reference");
        assert_eq!(path_label("API"), "Api");
    }

    #[test]
    fn test_base_url_with_port() {
        let links = vec![link("http://127.0.0.1:8080/docs/a", "A")];
        let tree = categorize_by_structure(&links, "http://127.0.0.1:8080/");
        assert_eq!(tree.urls(), vec!["http://127.0.0.1:8080/docs/a"]);
    }
}
