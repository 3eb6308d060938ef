//! Content reference resolution against an already-fetched snapshot.
//!
//! Every field access yields a [`FieldLookup`], which keeps "the field is not
//! there" ([`FieldLookup::Missing`]) apart from "the field points at a
//! document the snapshot does not have" ([`FieldLookup::AbsentReference`]).
//! Renderers need that distinction to degrade one field at a time: a banner
//! with a broken link still shows its title.

use vitrine_model::{ContentDocument, DocumentRef, Node, PageSnapshot, Payload, Value};
use vitrine_richtext::LinkResolver;

/// Outcome of looking a field up in a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldLookup<'a> {
    /// The field holds a value (scalar, rich text, list or nested payload).
    Value(&'a Value),
    /// The field is a reference and its document is in the index.
    Document(&'a ContentDocument),
    /// The field is not present in the payload.
    Missing,
    /// The field is a reference whose id is not in the index.
    AbsentReference(&'a DocumentRef),
}

impl<'a> FieldLookup<'a> {
    /// Whether the field was found and resolved.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Value(_) | Self::Document(_))
    }

    /// The field as a string, if it is a string scalar or rich text.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Self::Value(value) => value.as_str(),
            _ => None,
        }
    }

    /// The referenced document, if the field resolved to one.
    #[must_use]
    pub const fn as_document(&self) -> Option<&'a ContentDocument> {
        match self {
            Self::Document(document) => Some(document),
            _ => None,
        }
    }
}

/// Where a container item's content comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemContent<'a> {
    /// The node's own payload.
    Inline(&'a Payload),
    /// The fields of the document the node's content reference points at.
    Referenced(&'a ContentDocument),
    /// The node has a content reference that does not resolve.
    Broken(&'a DocumentRef),
}

/// Pure lookups against one snapshot's document index. No I/O.
#[derive(Debug, Clone, Copy)]
pub struct ContentResolver<'a> {
    snapshot: &'a PageSnapshot,
}

impl<'a> ContentResolver<'a> {
    /// A resolver over `snapshot`.
    #[must_use]
    pub const fn new(snapshot: &'a PageSnapshot) -> Self {
        Self { snapshot }
    }

    /// The snapshot being resolved against.
    #[must_use]
    pub const fn snapshot(&self) -> &'a PageSnapshot {
        self.snapshot
    }

    /// Look a reference up in the document index.
    #[must_use]
    pub fn resolve_reference(&self, reference: &DocumentRef) -> Option<&'a ContentDocument> {
        self.snapshot.document(reference.id())
    }

    /// Look `field_name` up in `payload`. Field names match exactly.
    #[must_use]
    pub fn resolve_field(&self, payload: &'a Payload, field_name: &str) -> FieldLookup<'a> {
        match payload.get(field_name) {
            None => FieldLookup::Missing,
            Some(value) => self.lookup_value(value),
        }
    }

    /// Follow a `/`-separated field path through nested payloads and
    /// referenced documents.
    ///
    /// Stops at the first segment that is missing or whose reference is
    /// absent and reports that outcome. A path that tries to descend into a
    /// scalar is [`FieldLookup::Missing`].
    #[must_use]
    pub fn resolve_path(&self, payload: &'a Payload, path: &str) -> FieldLookup<'a> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let Some(first) = segments.next() else {
            return FieldLookup::Missing;
        };
        let mut current = self.resolve_field(payload, first);
        for segment in segments {
            let inner = match current {
                FieldLookup::Value(Value::Payload(inner)) => inner,
                FieldLookup::Document(document) => &document.fields,
                FieldLookup::Value(_) => return FieldLookup::Missing,
                FieldLookup::Missing | FieldLookup::AbsentReference(_) => return current,
            };
            current = self.resolve_field(inner, segment);
        }
        current
    }

    /// The content a container item renders.
    ///
    /// A content reference takes precedence over the inline payload.
    #[must_use]
    pub fn item_content(&self, node: &'a Node) -> ItemContent<'a> {
        match &node.content {
            None => ItemContent::Inline(&node.payload),
            Some(reference) => self
                .resolve_reference(reference)
                .map_or(ItemContent::Broken(reference), ItemContent::Referenced),
        }
    }

    /// Canonical URL of a document, absolutised against the snapshot's base URL.
    #[must_use]
    pub fn canonical_url(&self, document: &ContentDocument) -> Option<String> {
        self.snapshot.canonical_url(document)
    }

    fn lookup_value(&self, value: &'a Value) -> FieldLookup<'a> {
        match value {
            Value::Reference(reference) => self
                .resolve_reference(reference)
                .map_or(FieldLookup::AbsentReference(reference), FieldLookup::Document),
            other => FieldLookup::Value(other),
        }
    }
}

impl LinkResolver for ContentResolver<'_> {
    fn resolve_link(&self, id: &str) -> Option<String> {
        let document = self.snapshot.document(id)?;
        let url = self.canonical_url(document);
        if url.is_none() {
            tracing::debug!(reference = id, "rich-text link target has no URL");
        }
        url
    }
}
