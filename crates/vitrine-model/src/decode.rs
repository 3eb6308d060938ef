//! Decoding the page model delivered by the content backend.
//!
//! The wire shape is a nested tree (`root` with `children`) plus a
//! `documents` object keyed by document id. Decoding flattens the tree into
//! the snapshot's arena and enforces that node ids are unique.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use thiserror::Error;

use crate::document::ContentDocument;
use crate::payload::{DocumentRef, Payload, Value};
use crate::{Node, NodeId, NodeKind, PageSnapshot};

/// Error type for page model decoding.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The page model is not valid JSON or does not have the expected shape.
    #[error("malformed page model: {0}")]
    Json(#[from] serde_json::Error),
    /// Two nodes share the same id.
    #[error("duplicate node id '{0}' in page model")]
    DuplicateNodeId(String),
}

/// One node of the page model as delivered on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeModel {
    /// Stable node id.
    pub id: String,
    /// Slot name under the parent (used by path lookups).
    #[serde(default)]
    pub name: Option<String>,
    /// Type label used to select a renderer.
    #[serde(rename = "type")]
    pub type_label: String,
    /// Container or container item.
    pub kind: NodeKind,
    /// Inline content payload.
    #[serde(default)]
    pub payload: Payload,
    /// Reference to the document holding this item's content.
    #[serde(default)]
    pub content: Option<DocumentRef>,
    /// Ordered children.
    #[serde(default)]
    pub children: Vec<NodeModel>,
}

impl NodeModel {
    fn new(kind: NodeKind, id: &str, type_label: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            type_label: type_label.to_string(),
            kind,
            payload: Payload::new(),
            content: None,
            children: Vec::new(),
        }
    }

    /// A container node with no children.
    #[must_use]
    pub fn container(id: &str, type_label: &str) -> Self {
        Self::new(NodeKind::Container, id, type_label)
    }

    /// A container item node with an empty payload.
    #[must_use]
    pub fn item(id: &str, type_label: &str) -> Self {
        Self::new(NodeKind::ContainerItem, id, type_label)
    }

    /// Set the slot name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Add a payload field.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        let _ = self.payload.insert(name, value);
        self
    }

    /// Point the item's content at a document.
    #[must_use]
    pub fn content_ref(mut self, id: &str) -> Self {
        self.content = Some(DocumentRef::new(id));
        self
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentModel {
    #[serde(default, alias = "canonicalUrl")]
    url: Option<String>,
    #[serde(default)]
    fields: Payload,
}

/// The complete page model: tree plus document index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageModel {
    /// Root of the component tree.
    pub root: NodeModel,
    /// Site base used to absolutize relative document links.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    documents: BTreeMap<String, DocumentModel>,
}

impl PageModel {
    /// A page model with the given root and an empty document index.
    #[must_use]
    pub const fn new(root: NodeModel) -> Self {
        Self {
            root,
            base_url: None,
            documents: BTreeMap::new(),
        }
    }

    /// Add a document to the index, replacing any document with the same id.
    #[must_use]
    pub fn document(mut self, document: ContentDocument) -> Self {
        let _ = self.documents.insert(
            document.id,
            DocumentModel {
                url: document.url,
                fields: document.fields,
            },
        );
        self
    }
}

impl PageSnapshot {
    /// Decode a page model from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Json`] if the text is not a page model and
    /// [`ModelError::DuplicateNodeId`] if node ids are not unique.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let model: PageModel = serde_json::from_str(json)?;
        Self::from_model(model)
    }

    /// Flatten a page model into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateNodeId`] if node ids are not unique.
    pub fn from_model(model: PageModel) -> Result<Self, ModelError> {
        let documents = model
            .documents
            .into_iter()
            .map(|(id, doc)| {
                let document = ContentDocument {
                    id: id.clone(),
                    url: doc.url,
                    fields: doc.fields,
                };
                (id, document)
            })
            .collect::<HashMap<_, _>>();

        let mut snapshot = Self {
            nodes: Vec::new(),
            by_id: HashMap::new(),
            documents,
            base_url: model.base_url,
        };
        let _ = snapshot.flatten(model.root, None)?;
        Ok(snapshot)
    }

    /// Allocate `model` and its descendants in pre-order, returning its id.
    fn flatten(&mut self, model: NodeModel, parent: Option<NodeId>) -> Result<NodeId, ModelError> {
        let id = NodeId(self.nodes.len());
        if self.by_id.insert(model.id.clone(), id).is_some() {
            return Err(ModelError::DuplicateNodeId(model.id));
        }
        self.nodes.push(Node {
            id: model.id,
            name: model.name,
            type_label: model.type_label,
            kind: model.kind,
            payload: model.payload,
            content: model.content,
            parent,
            children: Vec::new(),
        });

        for child in model.children {
            let child_id = self.flatten(child, Some(id))?;
            self.nodes[id.0].children.push(child_id);
        }
        Ok(id)
    }
}
