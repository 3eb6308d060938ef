//! The composer's output tree.
//!
//! A [`RenderNode`] carries the renderer it dispatched to, its resolved
//! [`Props`], its children in source order and a shared handle to the
//! render's [`RuntimeContext`]. Content problems show up as values here
//! ([`Prop::Unresolved`], [`RenderTarget::Empty`]), never as errors.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use serde::Serialize;
use vitrine_context::RuntimeContext;
use vitrine_model::Scalar;

use crate::registry::Renderer;

/// One resolved prop value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Prop {
    /// String, number or boolean, passed through.
    Scalar(Scalar),
    /// Rich text with internal links already rewritten.
    RichText(String),
    /// A reference cut short to avoid a cycle: id and URL only.
    Link {
        /// Referenced document id.
        id: String,
        /// Canonical URL, if the document has one.
        url: Option<String>,
    },
    /// A resolved reference with the document's own fields.
    Document(ResolvedDocument),
    /// A reference whose document is not in the snapshot.
    Unresolved {
        /// The id that could not be found.
        reference: String,
    },
    /// Ordered list.
    List(Vec<Prop>),
    /// Nested field map.
    Nested(Props),
}

impl Prop {
    /// The prop as a string if it is a string scalar or rich text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) | Self::RichText(s) => Some(s),
            _ => None,
        }
    }

    /// The URL this prop navigates to, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Link { url, .. } => url.as_deref(),
            Self::Document(document) => document.url.as_deref(),
            _ => None,
        }
    }

    /// Whether this prop is an unresolved reference.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}

/// A document embedded in props.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDocument {
    /// Document id.
    pub id: String,
    /// Canonical URL, joined to the base URL when relative.
    pub url: Option<String>,
    /// The document's fields, resolved the same way as item props.
    pub fields: Props,
}

/// Resolved props of a node, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Props {
    fields: BTreeMap<String, Prop>,
}

impl Props {
    /// No props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prop, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, prop: Prop) -> Option<Prop> {
        self.fields.insert(name.into(), prop)
    }

    /// Prop by field name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Prop> {
        self.fields.get(name)
    }

    /// Text of a string or rich-text prop.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Prop::as_str)
    }

    /// URL of a link or document prop.
    #[must_use]
    pub fn url(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Prop::url)
    }

    /// Whether the named prop is an unresolved reference.
    #[must_use]
    pub fn is_unresolved(&self, name: &str) -> bool {
        self.get(name).is_some_and(Prop::is_unresolved)
    }

    /// Iterate in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of props.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no props.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Prop)> for Props {
    fn from_iter<I: IntoIterator<Item = (String, Prop)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// What a render node dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "renderer", rename_all = "snake_case")]
pub enum RenderTarget {
    /// A registered renderer.
    Mapped(Renderer),
    /// Unmapped container: renders only its children.
    Passthrough,
    /// Renders nothing.
    Empty,
}

/// One node of the output tree.
#[derive(Debug, Clone, Serialize)]
pub struct RenderNode {
    /// Id of the source node.
    pub id: String,
    /// Slot name of the source node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Type label of the source node.
    #[serde(rename = "type")]
    pub type_label: String,
    /// Dispatch result.
    pub target: RenderTarget,
    /// Resolved props; empty for passthrough and empty nodes.
    #[serde(skip_serializing_if = "Props::is_empty")]
    pub props: Props,
    /// Children in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
    #[serde(skip)]
    context: Arc<RuntimeContext>,
}

impl RenderNode {
    /// Assemble a node. `context` is shared, not copied.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        type_label: impl Into<String>,
        target: RenderTarget,
        context: &Arc<RuntimeContext>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            type_label: type_label.into(),
            target,
            props: Props::new(),
            children: Vec::new(),
            context: Arc::clone(context),
        }
    }

    /// The render's shared runtime context.
    #[must_use]
    pub const fn context(&self) -> &Arc<RuntimeContext> {
        &self.context
    }

    /// The renderer, if the node is mapped.
    #[must_use]
    pub const fn renderer(&self) -> Option<Renderer> {
        match self.target {
            RenderTarget::Mapped(renderer) => Some(renderer),
            RenderTarget::Passthrough | RenderTarget::Empty => None,
        }
    }

    /// Whether the node renders nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target == RenderTarget::Empty
    }

    /// Whether the node is an unmapped container passthrough.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.target == RenderTarget::Passthrough
    }

    /// Pre-order walk over this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Print the tree to stdout for debugging.
    pub fn print_tree(&self) {
        print!("{self}");
    }

    fn write_tree(&self, out: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        let slot = self
            .name
            .as_deref()
            .map(|name| format!(" @{name}"))
            .unwrap_or_default();
        match self.target {
            RenderTarget::Mapped(renderer) => {
                writeln!(out, "{prefix}{}#{}{slot}", renderer.default_label(), self.id)?;
            }
            RenderTarget::Passthrough => {
                writeln!(out, "{prefix}({})#{}{slot}", self.type_label, self.id)?;
            }
            RenderTarget::Empty => {
                writeln!(out, "{prefix}<empty {}>#{}{slot}", self.type_label, self.id)?;
            }
        }
        for (name, prop) in self.props.iter() {
            writeln!(out, "{prefix}    {name} = {}", summarize(prop))?;
        }
        for child in &self.children {
            child.write_tree(out, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// One-line rendering of a prop for the tree printer.
fn summarize(prop: &Prop) -> String {
    match prop {
        Prop::Scalar(Scalar::String(s)) => format!("{s:?}"),
        Prop::Scalar(Scalar::Number(n)) => n.to_string(),
        Prop::Scalar(Scalar::Bool(b)) => b.to_string(),
        Prop::RichText(html) => {
            let display = html.replace('\n', "\\n");
            format!("html{display:?}")
        }
        Prop::Link { id, url } => format!("link {id} -> {}", url.as_deref().unwrap_or("-")),
        Prop::Document(document) => format!(
            "document {} -> {} ({} fields)",
            document.id,
            document.url.as_deref().unwrap_or("-"),
            document.fields.len()
        ),
        Prop::Unresolved { reference } => format!("unresolved {reference}"),
        Prop::List(items) => {
            let mut out = String::from("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}", summarize(item));
            }
            out.push(']');
            out
        }
        Prop::Nested(props) => format!("{{{} fields}}", props.len()),
    }
}
