//! Page snapshot model for the Vitrine page composer.
//!
//! This crate provides the immutable input of one render: an arena-based tree
//! of typed nodes (containers and container items) plus a flat index of
//! content documents keyed by id.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships,
//! providing O(1) access and traversal without borrow checker issues. A
//! snapshot is built once from a decoded [`PageModel`] and never mutated.

pub mod decode;
pub mod document;
pub mod payload;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use decode::{ModelError, NodeModel, PageModel};
pub use document::ContentDocument;
pub use payload::{DocumentRef, Payload, RICH_TEXT_CONTENT_TYPE, Scalar, Value};

/// A type-safe index into the snapshot's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// Structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Holds ordered children. A mapped container may also carry a payload.
    #[serde(alias = "component")]
    Container,
    /// Leaf with respect to tree shape; carries a content payload.
    ContainerItem,
}

/// One node of the page tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Stable id, unique within the snapshot.
    pub id: String,
    /// Slot name under the parent.
    pub name: Option<String>,
    /// Identifies which renderer handles the node.
    pub type_label: String,
    /// Container or container item.
    pub kind: NodeKind,
    /// Inline content payload.
    pub payload: Payload,
    /// Reference to a document holding this item's content, if any.
    pub content: Option<DocumentRef>,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Ordered children.
    pub children: Vec<NodeId>,
}

/// Immutable tree plus document index for one render.
///
/// The root node is always at [`NodeId::ROOT`].
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    nodes: Vec<Node>,
    by_id: HashMap<String, NodeId>,
    documents: HashMap<String, ContentDocument>,
    base_url: Option<String>,
}

impl PageSnapshot {
    /// Get the root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its arena ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a snapshot has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Look a node up by its page-model id.
    #[must_use]
    pub fn node_by_id(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    /// Look a document up in the index.
    #[must_use]
    pub fn document(&self, id: &str) -> Option<&ContentDocument> {
        self.documents.get(id)
    }

    /// Number of documents in the index.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Site base used for canonical URLs.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Replace the site base (the configuration takes precedence over the page model).
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    /// Canonical URL of a document under this snapshot's site base.
    #[must_use]
    pub fn canonical_url(&self, document: &ContentDocument) -> Option<String> {
        document.canonical_url(self.base_url())
    }

    /// Locate a sub-tree by slash-separated slot names from the root.
    ///
    /// `""` is the root itself; `"main/banner"` is the child named `banner`
    /// of the root's child named `main`.
    #[must_use]
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root(), |current, segment| {
                self.children(current).iter().copied().find(|&child| {
                    self.get(child)
                        .is_some_and(|n| n.name.as_deref() == Some(segment))
                })
            })
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            snapshot: self,
            current: self.parent(id),
        }
    }

    /// Iterate over every node id in tree order (depth-first, pre-order).
    #[must_use]
    pub fn iter_all(&self) -> PreorderIterator<'_> {
        PreorderIterator {
            snapshot: self,
            stack: if self.nodes.is_empty() {
                Vec::new()
            } else {
                vec![NodeId::ROOT]
            },
        }
    }
}

/// Iterator over ancestors of a node.
#[derive(Debug)]
pub struct AncestorIterator<'a> {
    snapshot: &'a PageSnapshot,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.snapshot.parent(id);
        Some(id)
    }
}

/// Depth-first pre-order iterator over a snapshot.
#[derive(Debug)]
pub struct PreorderIterator<'a> {
    snapshot: &'a PageSnapshot,
    stack: Vec<NodeId>,
}

impl Iterator for PreorderIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.snapshot.children(id).iter().rev().copied());
        Some(id)
    }
}
