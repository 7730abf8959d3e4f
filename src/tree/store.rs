//! Hierarchical node store shared by both categorizers
//!
//! A `CategorizedTree` owns its nodes in a flat id-indexed map. Parent and
//! child links are kept in both directions and are only ever created through
//! `create_node`, which refuses anything that would break the hierarchy.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use thiserror::Error;

/// Errors raised when a mutation or a deserialized tree would break the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node id already exists: {0}")]
    DuplicateId(String),

    #[error("Parent node not found: {0}")]
    MissingParent(String),

    #[error("Tree already has a root ({0})")]
    RootExists(String),

    #[error("Root node {0} cannot have a parent")]
    ParentedRoot(String),

    #[error("Non-root node {0} must have a parent")]
    OrphanNode(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid serialized tree: {0}")]
    Invalid(String),
}

/// What a node represents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Category {
        description: Option<String>,
    },
    Link {
        url: String,
        /// 1 (least) to 5 (most); only the semantic tree sets it
        importance: Option<u8>,
    },
}

impl NodeKind {
    /// Lowercase tag used in the serialized form
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Category { .. } => "category",
            Self::Link { .. } => "link",
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Link { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link { .. })
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Category { description } => description.as_deref(),
            _ => None,
        }
    }

    pub fn importance(&self) -> Option<u8> {
        match self {
            Self::Link { importance, .. } => *importance,
            _ => None,
        }
    }
}

/// A single node in a categorized tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub parent_id: Option<String>,
    pub children_ids: Vec<String>,
}

/// Serialized node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializedKind {
    Root,
    Category,
    Link,
}

/// Optional node attributes as they appear on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
}

/// Flat on-disk form of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub label: String,
    pub kind: SerializedKind,
    #[serde(default)]
    pub attributes: NodeAttributes,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children_ids: Vec<String>,
}

/// Flat id -> node mapping
pub type SerializedTree = BTreeMap<String, SerializedNode>;

/// A strict hierarchy of nodes indexed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedTree {
    nodes: HashMap<String, TreeNode>,
    root_id: Option<String>,
}

impl CategorizedTree {
    /// Creates an empty tree with no root
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree holding only a root node with id `root`
    pub fn with_root(label: &str) -> Self {
        let mut tree = Self::new();
        tree.nodes.insert(
            "root".to_string(),
            TreeNode {
                id: "root".to_string(),
                label: label.to_string(),
                kind: NodeKind::Root,
                parent_id: None,
                children_ids: Vec::new(),
            },
        );
        tree.root_id = Some("root".to_string());
        tree
    }

    /// Inserts a node under an existing parent
    ///
    /// The root is created with `parent_id = None` and `NodeKind::Root`, once.
    /// Every other node needs a parent that already exists, so cycles can never
    /// form.
    pub fn create_node(
        &mut self,
        label: &str,
        id: &str,
        parent_id: Option<&str>,
        kind: NodeKind,
    ) -> Result<(), TreeError> {
        if self.nodes.contains_key(id) {
            return Err(TreeError::DuplicateId(id.to_string()));
        }

        match (&kind, parent_id) {
            (NodeKind::Root, Some(_)) => return Err(TreeError::ParentedRoot(id.to_string())),
            (NodeKind::Root, None) => {
                if let Some(existing) = &self.root_id {
                    return Err(TreeError::RootExists(existing.clone()));
                }
                self.root_id = Some(id.to_string());
            }
            (_, None) => return Err(TreeError::OrphanNode(id.to_string())),
            (_, Some(parent)) => {
                let parent_node = self
                    .nodes
                    .get_mut(parent)
                    .ok_or_else(|| TreeError::MissingParent(parent.to_string()))?;
                parent_node.children_ids.push(id.to_string());
            }
        }

        self.nodes.insert(
            id.to_string(),
            TreeNode {
                id: id.to_string(),
                label: label.to_string(),
                kind,
                parent_id: parent_id.map(str::to_string),
                children_ids: Vec::new(),
            },
        );

        Ok(())
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root_id.as_deref().and_then(|id| self.nodes.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the children of a node in insertion order
    pub fn children_of(&self, id: &str) -> Result<Vec<&TreeNode>, TreeError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;

        Ok(node
            .children_ids
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .collect())
    }

    /// Pre-order traversal starting at `start`, yielding `(depth, node)`
    ///
    /// The start node has depth 0. An unknown start id yields nothing.
    pub fn walk<'a>(&'a self, start: &str) -> Walk<'a> {
        let stack = match self.nodes.get(start) {
            Some(node) => vec![(0, node)],
            None => Vec::new(),
        };
        Walk { tree: self, stack }
    }

    /// Pre-order traversal of the whole tree
    pub fn walk_from_root(&self) -> Walk<'_> {
        match self.root_id.as_deref() {
            Some(root) => self.walk(root),
            None => Walk {
                tree: self,
                stack: Vec::new(),
            },
        }
    }

    /// All link leaves reachable from the root, in traversal order
    pub fn links(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.walk_from_root()
            .map(|(_, node)| node)
            .filter(|node| node.kind.is_link())
    }

    /// URLs of all reachable link leaves, in traversal order
    pub fn urls(&self) -> Vec<&str> {
        self.links().filter_map(|node| node.kind.url()).collect()
    }

    /// Flattens the tree into an id -> node mapping
    pub fn serialize(&self) -> SerializedTree {
        self.nodes
            .values()
            .map(|node| {
                let (kind, attributes) = match &node.kind {
                    NodeKind::Root => (SerializedKind::Root, NodeAttributes::default()),
                    NodeKind::Category { description } => (
                        SerializedKind::Category,
                        NodeAttributes {
                            description: description.clone(),
                            ..Default::default()
                        },
                    ),
                    NodeKind::Link { url, importance } => (
                        SerializedKind::Link,
                        NodeAttributes {
                            url: Some(url.clone()),
                            importance: *importance,
                            ..Default::default()
                        },
                    ),
                };

                (
                    node.id.clone(),
                    SerializedNode {
                        label: node.label.clone(),
                        kind,
                        attributes,
                        parent_id: node.parent_id.clone(),
                        children_ids: node.children_ids.clone(),
                    },
                )
            })
            .collect()
    }

    /// Rebuilds a tree from its flat form, re-checking every invariant
    ///
    /// Nodes are re-inserted breadth-first from the single root following each
    /// node's `children_ids` order. Any node not reached that way (orphans,
    /// cycles, or mismatched parent pointers) makes the whole tree invalid.
    pub fn from_serialized(serialized: &SerializedTree) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        if serialized.is_empty() {
            return Ok(tree);
        }

        let roots: Vec<&String> = serialized
            .iter()
            .filter(|(_, node)| node.parent_id.is_none())
            .map(|(id, _)| id)
            .collect();

        let root_id = match roots.as_slice() {
            [single] => (*single).clone(),
            [] => return Err(TreeError::Invalid("no root node".to_string())),
            _ => {
                return Err(TreeError::Invalid(format!(
                    "{} nodes without a parent",
                    roots.len()
                )))
            }
        };

        let mut queue = VecDeque::from([root_id]);
        while let Some(id) = queue.pop_front() {
            let node = serialized
                .get(&id)
                .ok_or_else(|| TreeError::Invalid(format!("child {} is missing", id)))?;

            if let Some(parent) = &node.parent_id {
                let listed = serialized
                    .get(parent)
                    .map(|p| p.children_ids.contains(&id))
                    .unwrap_or(false);
                if !listed {
                    return Err(TreeError::Invalid(format!(
                        "node {} is not listed as a child of {}",
                        id, parent
                    )));
                }
            }

            let kind = deserialize_kind(&id, node)?;
            tree.create_node(&node.label, &id, node.parent_id.as_deref(), kind)?;
            queue.extend(node.children_ids.iter().cloned());
        }

        if tree.len() != serialized.len() {
            return Err(TreeError::Invalid(format!(
                "{} of {} nodes are unreachable from the root",
                serialized.len() - tree.len(),
                serialized.len()
            )));
        }

        Ok(tree)
    }
}

fn deserialize_kind(id: &str, node: &SerializedNode) -> Result<NodeKind, TreeError> {
    match node.kind {
        SerializedKind::Root => Ok(NodeKind::Root),
        SerializedKind::Category => Ok(NodeKind::Category {
            description: node.attributes.description.clone(),
        }),
        SerializedKind::Link => {
            let url = node
                .attributes
                .url
                .clone()
                .ok_or_else(|| TreeError::Invalid(format!("link {} has no url", id)))?;
            Ok(NodeKind::Link {
                url,
                importance: node.attributes.importance,
            })
        }
    }
}

/// Finite pre-order iterator over a subtree
pub struct Walk<'a> {
    tree: &'a CategorizedTree,
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in node.children_ids.iter().rev() {
            if let Some(child_node) = self.tree.nodes.get(child) {
                self.stack.push((depth + 1, child_node));
            }
        }
        Some((depth, node))
    }
}
