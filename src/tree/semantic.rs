//! LLM-driven semantic categorization
//!
//! The model is asked to group the base-domain links into named categories.
//! Whatever goes wrong along the way (no key, transport failure, unparseable
//! reply, empty categorization) the caller still gets a tree: the structural
//! categorization of the same links.

use crate::crawler::Link;
use crate::llm::{CompletionClient, LlmError};
use crate::tree::response::{parse_categorization, CategoryEntry, ResponseError};
use crate::tree::store::{CategorizedTree, NodeKind, TreeError};
use crate::tree::structure::{base_domain_links, categorize_by_structure, link_label, GroupedLink};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

pub const ENHANCED_ROOT_LABEL: &str = "Enhanced Structure";

/// Categories, subcategories and sub-subcategories; deeper levels are ignored
const MAX_LEVELS: usize = 3;

/// Reasons a semantic categorization fell back to the structural one
#[derive(Debug, Error)]
pub enum CategorizeError {
    #[error("no links on the base domain")]
    NoBaseLinks,

    #[error("could not encode prompt: {0}")]
    Prompt(#[from] serde_json::Error),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("unusable categorization: {0}")]
    Response(#[from] ResponseError),

    #[error("categorization produced an invalid tree: {0}")]
    Tree(#[from] TreeError),
}

#[derive(Serialize)]
struct PromptLink<'a> {
    url: &'a str,
    text: &'a str,
    path: &'a str,
}

/// Builds the enhanced tree through a completion client
#[derive(Clone)]
pub struct SemanticCategorizer {
    client: Arc<dyn CompletionClient>,
}

impl SemanticCategorizer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Categorizes links by meaning, falling back to URL structure on any failure
    ///
    /// # Arguments
    ///
    /// * `links` - Links extracted from the root page
    /// * `base_url` - The crawled URL; only links on its domain are sent
    ///
    /// # Returns
    ///
    /// The enhanced tree, or exactly `categorize_by_structure(links, base_url)`
    /// when the model could not be used.
    pub async fn categorize_with_llm(&self, links: &[Link], base_url: &str) -> CategorizedTree {
        match self.try_categorize(links, base_url).await {
            Ok(tree) => {
                tracing::info!(
                    "Semantic categorization produced {} links",
                    tree.urls().len()
                );
                tree
            }
            Err(e) => {
                tracing::warn!("Semantic categorization failed, using URL structure: {}", e);
                categorize_by_structure(links, base_url)
            }
        }
    }

    async fn try_categorize(
        &self,
        links: &[Link],
        base_url: &str,
    ) -> Result<CategorizedTree, CategorizeError> {
        let base_links = base_domain_links(links, base_url);
        if base_links.is_empty() {
            return Err(CategorizeError::NoBaseLinks);
        }

        let prompt = build_prompt(base_url, &base_links)?;
        let reply = self.client.complete(&prompt).await?;
        tracing::debug!("Received {} byte categorization reply", reply.len());

        let categories = parse_categorization(&reply)?;
        Ok(build_enhanced_tree(&categories)?)
    }
}

/// Renders the categorization prompt for a set of base-domain links
pub fn build_prompt(base_url: &str, links: &[GroupedLink]) -> Result<String, serde_json::Error> {
    let link_data: Vec<PromptLink<'_>> = links
        .iter()
        .map(|link| PromptLink {
            url: &link.url,
            text: &link.text,
            path: &link.path,
        })
        .collect();
    let link_json = serde_json::to_string_pretty(&link_data)?;

    Ok(format!(
        r#"Analyze and categorize these links from {base_url} into a logical tree structure with up to 3 levels of hierarchy.

Links to categorize: {link_json}

Return a JSON object with this structure:
{{
    "categories": [
        {{
            "name": "Category Name",
            "description": "Short description",
            "links": [
                {{
                    "url": "full_url_here",
                    "text": "link_text_here",
                    "importance": 1-5 (where 5 is most important)
                }}
            ],
            "subcategories": [
                {{
                    "name": "Subcategory Name",
                    "description": "Short description",
                    "links": [
                        {{
                            "url": "full_url_here",
                            "text": "link_text_here",
                            "importance": 1-5
                        }}
                    ],
                    "subcategories": [
                        {{
                            "name": "Sub-subcategory Name",
                            "description": "Short description",
                            "links": [
                                {{
                                    "url": "full_url_here",
                                    "text": "link_text_here",
                                    "importance": 1-5
                                }}
                            ]
                        }}
                    ]
                }}
            ]
        }}
    ]
}}

Guidelines:
1. Group similar links together
2. Use meaningful category names
3. Include ALL links in your categorization
4. Create up to 3 levels of hierarchy (categories, subcategories, sub-subcategories)
5. Output ONLY valid JSON, no explanations or markdown
"#
    ))
}

/// Lowercases a category name and replaces anything non-alphanumeric with `_`
pub fn normalize_category_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '_'
            }
        })
        .collect()
}

/// Turns parsed categories into a tree rooted at `Enhanced Structure`
///
/// Top-level ids are `category_<normalized name>`, suffixed `_2`, `_3`, ...
/// when two names normalize the same. Subcategories are `<parent>/subcat_<j>`
/// and links `<parent>/link_<k>`. Levels below sub-subcategories are ignored.
pub fn build_enhanced_tree(categories: &[CategoryEntry]) -> Result<CategorizedTree, TreeError> {
    let mut tree = CategorizedTree::with_root(ENHANCED_ROOT_LABEL);
    let mut used_ids: HashSet<String> = HashSet::new();

    for category in categories {
        let name = category.name.as_deref().unwrap_or("Uncategorized");
        let base_id = format!("category_{}", normalize_category_name(name));
        let mut id = base_id.clone();
        let mut suffix = 2;
        while !used_ids.insert(id.clone()) {
            id = format!("{}_{}", base_id, suffix);
            suffix += 1;
        }

        tree.create_node(
            name,
            &id,
            Some("root"),
            NodeKind::Category {
                description: category.description.clone(),
            },
        )?;
        add_category_contents(&mut tree, &id, category, 1)?;
    }

    Ok(tree)
}

fn add_category_contents(
    tree: &mut CategorizedTree,
    parent_id: &str,
    category: &CategoryEntry,
    level: usize,
) -> Result<(), TreeError> {
    for (k, link) in category.links.iter().enumerate() {
        tree.create_node(
            &link_label(&link.text, &link.url),
            &format!("{}/link_{}", parent_id, k),
            Some(parent_id),
            NodeKind::Link {
                url: link.url.clone(),
                importance: Some(link.importance),
            },
        )?;
    }

    if level >= MAX_LEVELS {
        if !category.subcategories.is_empty() {
            tracing::debug!(
                "Ignoring {} nested subcategories under {}",
                category.subcategories.len(),
                parent_id
            );
        }
        return Ok(());
    }

    for (j, subcategory) in category.subcategories.iter().enumerate() {
        let id = format!("{}/subcat_{}", parent_id, j);
        let name = subcategory.name.clone().unwrap_or_else(|| {
            if level + 1 >= MAX_LEVELS {
                format!("Sub-subcategory {}", j + 1)
            } else {
                format!("Subcategory {}", j + 1)
            }
        });

        tree.create_node(
            &name,
            &id,
            Some(parent_id),
            NodeKind::Category {
                description: subcategory.description.clone(),
            },
        )?;
        add_category_contents(tree, &id, subcategory, level + 1)?;
    }

    Ok(())
}
