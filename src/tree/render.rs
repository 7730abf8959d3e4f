use crate::tree::store::{CategorizedTree, NodeKind};

/// Renders a tree as nested markdown bullets
///
/// Categories are bold, links are markdown links with an importance suffix
/// when the node carries one. The root becomes the bullet list's first line.
pub fn render_markdown(tree: &CategorizedTree) -> String {
    let mut out = String::new();

    for (depth, node) in tree.walk_from_root() {
        let indent = "  ".repeat(depth);
        let line = match &node.kind {
            NodeKind::Root => format!("- **{}**", node.label),
            NodeKind::Category { description } => match description {
                Some(description) => format!("{}- **{}**: {}", indent, node.label, description),
                None => format!("{}- **{}**", indent, node.label),
            },
            NodeKind::Link { url, importance } => match importance {
                Some(score) => format!("{}- [{}]({}) (importance: {})", indent, node.label, url, score),
                None => format!("{}- [{}]({})", indent, node.label, url),
            },
        };
        out.push_str(&line);
        out.push('\n');
    }

    out
}
