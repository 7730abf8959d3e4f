//! Markdown rendering of a crawl bundle
//!
//! This module generates the `tree_structure.md` document: both trees as
//! nested bullet lists under a short header.

use crate::cache::CacheBundle;
use crate::tree::render_markdown;

/// Formats both trees of a bundle as one markdown document
///
/// # Arguments
///
/// * `bundle` - The crawl bundle
///
/// # Returns
///
/// A formatted markdown string
pub fn format_tree_document(bundle: &CacheBundle) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Site Structure: {}\n\n", bundle.base_url));
    md.push_str(&format!("- **Links found**: {}\n", bundle.links.len()));
    md.push_str(&format!("- **Pages with content**: {}\n\n", bundle.pages.len()));

    md.push_str("## Enhanced Tree\n\n");
    md.push_str(&render_markdown(&bundle.enhanced_tree));
    md.push('\n');

    md.push_str("## Conventional Tree\n\n");
    md.push_str(&render_markdown(&bundle.conventional_tree));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Link;
    use crate::tree::categorize_by_structure;

    #[test]
    fn test_format_tree_document() {
        let links = vec![Link::new("https://ex.com/docs/a", "A")];
        let tree = categorize_by_structure(&links, "https://ex.com");
        let bundle = CacheBundle {
            base_url: "https://ex.com".to_string(),
            links,
            conventional_tree: tree.clone(),
            enhanced_tree: tree,
            pages: Default::default(),
        };

        let md = format_tree_document(&bundle);
        assert!(md.starts_with("# Site Structure: https://ex.com\n"));
        assert!(md.contains("- **Links found**: 1\n"));
        assert!(md.contains("## Enhanced Tree\n\n- **Website Structure**\n"));
        assert!(md.contains("      - [A](https://ex.com/docs/a)\n"));
    }
}
