//! Depth-first composition of a page snapshot into a render tree.
//!
//! # Algorithm
//!
//! For each node, pre-order:
//! 1. Look its type label up in the [`MappingRegistry`].
//! 2. Unmapped container: emit a passthrough node and still compose its
//!    children. Unmapped item: emit an empty node.
//! 3. Mapped: resolve the node's content into props, rewrite rich text,
//!    attach the shared context and compose the children.
//!
//! Children keep their source order. Nothing in here fails: missing fields,
//! broken references and unknown labels degrade at the narrowest scope (one
//! prop or one leaf).
//!
//! Within one node's props a document is embedded at most once. Any later
//! reference to it, cyclic or not, becomes a [`Prop::Link`], so the props of
//! a node grow at most linearly with the number of documents.

use std::collections::HashSet;
use std::sync::Arc;

use vitrine_common::warning::warn_once;
use vitrine_context::RuntimeContext;
use vitrine_model::{
    ContentDocument, DocumentRef, Node, NodeId, NodeKind, PageSnapshot, Payload, Value,
};
use vitrine_richtext::rewrite;

use crate::registry::{Lookup, MappingRegistry};
use crate::render::{Prop, Props, RenderNode, RenderTarget, ResolvedDocument};
use crate::resolver::{ContentResolver, FieldLookup, ItemContent};

/// Compose the sub-tree rooted at `root`.
///
/// An id outside the snapshot yields an empty node.
#[must_use]
pub fn compose(
    root: NodeId,
    snapshot: &PageSnapshot,
    registry: &MappingRegistry,
    context: &Arc<RuntimeContext>,
) -> RenderNode {
    let composer = Composer {
        resolver: ContentResolver::new(snapshot),
        registry,
        context,
    };
    composer.compose_node(root)
}

/// Compose the sub-tree at a `/`-separated slot path (see
/// [`PageSnapshot::find_path`]). Returns `None` if nothing is at `path`.
#[must_use]
pub fn compose_path(
    path: &str,
    snapshot: &PageSnapshot,
    registry: &MappingRegistry,
    context: &Arc<RuntimeContext>,
) -> Option<RenderNode> {
    let Some(root) = snapshot.find_path(path) else {
        tracing::debug!(path, "no component at path");
        return None;
    };
    Some(compose(root, snapshot, registry, context))
}

struct Composer<'a> {
    resolver: ContentResolver<'a>,
    registry: &'a MappingRegistry,
    context: &'a Arc<RuntimeContext>,
}

impl<'a> Composer<'a> {
    fn compose_node(&self, id: NodeId) -> RenderNode {
        let Some(node) = self.resolver.snapshot().get(id) else {
            tracing::debug!(node = id.0, "node is outside the snapshot");
            return RenderNode::new("", "", RenderTarget::Empty, self.context);
        };

        let mut out = match self.registry.resolve(&node.type_label) {
            Lookup::Unmapped => {
                let _ = warn_once(
                    "COMPOSE",
                    &format!("no renderer for type label '{}'", node.type_label),
                );
                tracing::debug!(node = %node.id, type_label = %node.type_label, "unmapped");
                match node.kind {
                    NodeKind::Container => self.shell(node, RenderTarget::Passthrough),
                    NodeKind::ContainerItem => return self.shell(node, RenderTarget::Empty),
                }
            }
            Lookup::Mapped(renderer) => {
                let mut out = self.shell(node, RenderTarget::Mapped(renderer));
                match node.kind {
                    NodeKind::Container => out.props = self.resolve_payload(&node.payload),
                    NodeKind::ContainerItem => match self.resolver.item_content(node) {
                        ItemContent::Inline(payload) => out.props = self.resolve_payload(payload),
                        ItemContent::Referenced(document) => {
                            let mut embedded = HashSet::from([document.id.as_str()]);
                            out.props = self.resolve_fields(&document.fields, &mut embedded);
                        }
                        ItemContent::Broken(reference) => {
                            tracing::debug!(
                                node = %node.id,
                                reference = reference.id(),
                                "item content reference is absent"
                            );
                            out.target = RenderTarget::Empty;
                        }
                    },
                }
                out
            }
        };

        out.children = self
            .resolver
            .snapshot()
            .children(id)
            .iter()
            .map(|&child| self.compose_node(child))
            .collect();
        out
    }

    fn shell(&self, node: &Node, target: RenderTarget) -> RenderNode {
        let mut out = RenderNode::new(&node.id, &node.type_label, target, self.context);
        out.name.clone_from(&node.name);
        out
    }

    fn resolve_payload(&self, payload: &'a Payload) -> Props {
        self.resolve_fields(payload, &mut HashSet::new())
    }

    /// Resolve every field of `payload`. `embedded` holds the ids of documents
    /// already embedded in the current node's props.
    fn resolve_fields(&self, payload: &'a Payload, embedded: &mut HashSet<&'a str>) -> Props {
        payload
            .iter()
            .filter_map(|(name, _)| {
                let lookup = self.resolver.resolve_field(payload, name);
                let prop = self.resolve_lookup(lookup, embedded)?;
                Some((name.to_string(), prop))
            })
            .collect()
    }

    fn resolve_lookup(
        &self,
        lookup: FieldLookup<'a>,
        embedded: &mut HashSet<&'a str>,
    ) -> Option<Prop> {
        match lookup {
            FieldLookup::Value(value) => Some(self.resolve_value(value, embedded)),
            FieldLookup::Document(document) => Some(self.embed(document, embedded)),
            FieldLookup::AbsentReference(reference) => Some(unresolved(reference)),
            FieldLookup::Missing => None,
        }
    }

    fn resolve_value(&self, value: &'a Value, embedded: &mut HashSet<&'a str>) -> Prop {
        match value {
            Value::Scalar(scalar) => Prop::Scalar(scalar.clone()),
            Value::RichText(html) => Prop::RichText(rewrite(html, &self.resolver)),
            Value::List(items) => Prop::List(
                items
                    .iter()
                    .map(|item| self.resolve_value(item, embedded))
                    .collect(),
            ),
            Value::Payload(inner) => Prop::Nested(self.resolve_fields(inner, embedded)),
            Value::Reference(reference) => self
                .resolver
                .resolve_reference(reference)
                .map_or_else(|| unresolved(reference), |document| self.embed(document, embedded)),
        }
    }

    /// Embed a referenced document, or link to it if it was already embedded.
    fn embed(&self, document: &'a ContentDocument, embedded: &mut HashSet<&'a str>) -> Prop {
        let url = self.resolver.canonical_url(document);
        if !embedded.insert(document.id.as_str()) {
            tracing::debug!(reference = %document.id, "document already embedded");
            return Prop::Link {
                id: document.id.clone(),
                url,
            };
        }
        Prop::Document(ResolvedDocument {
            id: document.id.clone(),
            url,
            fields: self.resolve_fields(&document.fields, embedded),
        })
    }
}

fn unresolved(reference: &DocumentRef) -> Prop {
    tracing::debug!(reference = reference.id(), "absent reference");
    Prop::Unresolved {
        reference: reference.id().to_string(),
    }
}
