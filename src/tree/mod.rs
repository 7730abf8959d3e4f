//! Link categorization trees
//!
//! This module provides:
//! - `CategorizedTree`, a strict id-indexed hierarchy of categories and links
//! - structural categorization by URL path
//! - semantic categorization through a completion client, with fallback
//! - markdown rendering of either tree

mod render;
pub mod response;
mod semantic;
mod store;
mod structure;

pub use render::render_markdown;
pub use semantic::{
    build_enhanced_tree, build_prompt, normalize_category_name, CategorizeError,
    SemanticCategorizer, ENHANCED_ROOT_LABEL,
};
pub use store::{
    CategorizedTree, NodeAttributes, NodeKind, SerializedKind, SerializedNode, SerializedTree,
    TreeError, TreeNode, Walk,
};
pub use structure::{
    base_domain_links, categorize_by_structure, group_by_domain, link_label, path_label,
    GroupedLink, MAIN_CATEGORY_ID, STRUCTURE_ROOT_LABEL,
};
