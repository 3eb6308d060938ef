//! Content documents: the entries of a snapshot's document index.

use vitrine_common::url::resolve_url;

use crate::payload::Payload;

/// A content document referenced from payload fields.
///
/// Documents are owned by the [`PageSnapshot`](crate::PageSnapshot) index and
/// looked up by id; they are never fetched at composition time.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    /// Document id, unique within the index.
    pub id: String,
    /// Link as delivered by the page model, absolute or site-relative.
    pub url: Option<String>,
    /// Document fields (same shape as an item payload).
    pub fields: Payload,
}

impl ContentDocument {
    /// Create a document with no fields.
    #[must_use]
    pub fn new(id: impl Into<String>, url: Option<String>) -> Self {
        Self {
            id: id.into(),
            url,
            fields: Payload::new(),
        }
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with_fields(mut self, fields: Payload) -> Self {
        self.fields = fields;
        self
    }

    /// The document's canonical URL, joined onto `base_url` when relative.
    ///
    /// A document without a link has no canonical URL; consumers treat it as
    /// non-navigable.
    #[must_use]
    pub fn canonical_url(&self, base_url: Option<&str>) -> Option<String> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| resolve_url(url, base_url))
    }
}
