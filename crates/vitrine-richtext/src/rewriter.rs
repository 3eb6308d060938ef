//! Internal-link rewriting for rich text.
//!
//! Rich text authored in the CMS points at other documents with markers
//! instead of URLs:
//!
//! ```text
//! <a data-type="internal" data-ref="doc-1">Sale</a>
//! <img data-ref="img-7" alt="Hero">
//! ```
//!
//! [`rewrite`] replaces each marker with the referenced document's canonical
//! URL. A marker whose reference does not resolve becomes an inert
//! `<span data-unresolved="ID">`, keeping its text. A stray `<` that does not
//! open markup is emitted as `&lt;`. The output never contains a `data-ref`
//! attribute or a stray `<`, so rewriting its own output is a no-op.

use std::fmt::Write as _;

use vitrine_model::PageSnapshot;

use crate::scanner::{Attribute, Segment, StartTag, scan};

/// Attribute carrying the referenced document id.
pub const REF_ATTRIBUTE: &str = "data-ref";

/// Attribute left on inert spans produced for unresolvable markers.
pub const UNRESOLVED_ATTRIBUTE: &str = "data-unresolved";

/// Resolves a document id to a navigable URL.
///
/// Implemented by the snapshot itself and by the composer's content
/// resolver; `None` means the reference is absent or has no link.
pub trait LinkResolver {
    /// Canonical URL of the document with this id.
    fn resolve_link(&self, id: &str) -> Option<String>;
}

impl LinkResolver for PageSnapshot {
    fn resolve_link(&self, id: &str) -> Option<String> {
        self.document(id).and_then(|doc| self.canonical_url(doc))
    }
}

/// How an open `<a>` was emitted, so its `</a>` can be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Emitted as an `<a>` (untouched or rewritten).
    Link,
    /// Emitted as an inert `<span>`.
    Inert,
}

/// Rewrite internal reference markers in `html` to final URLs.
///
/// Never fails and never drops text: unresolvable markers degrade to inert
/// spans.
#[must_use]
pub fn rewrite<R: LinkResolver + ?Sized>(html: &str, links: &R) -> String {
    // Fast path: no markup at all.
    if !html.contains('<') {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len());
    let mut anchors: Vec<Anchor> = Vec::new();

    for segment in scan(html) {
        match segment {
            Segment::StartTag(tag) if tag.name == "a" => {
                let anchor = rewrite_anchor(&tag, links, &mut out);
                if !tag.self_closing {
                    anchors.push(anchor);
                }
            }
            Segment::StartTag(tag) if tag.name == "img" => rewrite_image(&tag, links, &mut out),
            Segment::EndTag { ref name, raw } if name == "a" => match anchors.pop() {
                Some(Anchor::Inert) => out.push_str("</span>"),
                _ => out.push_str(raw),
            },
            Segment::Text(text) => push_text(&mut out, text),
            other => out.push_str(other.raw()),
        }
    }
    out
}

fn rewrite_anchor<R: LinkResolver + ?Sized>(
    tag: &StartTag<'_>,
    links: &R,
    out: &mut String,
) -> Anchor {
    let Some(id) = tag.attribute(REF_ATTRIBUTE) else {
        out.push_str(tag.raw);
        return Anchor::Link;
    };

    if let Some(url) = links.resolve_link(id) {
        out.push_str("<a");
        push_attributes(out, tag, &["href", REF_ATTRIBUTE, "data-type"]);
        push_attribute(out, "href", &url);
        out.push_str(if tag.self_closing { " />" } else { ">" });
        Anchor::Link
    } else {
        tracing::debug!(reference = id, "rich-text link did not resolve");
        push_inert(out, id);
        if tag.self_closing {
            out.push_str("</span>");
        }
        Anchor::Inert
    }
}

fn rewrite_image<R: LinkResolver + ?Sized>(tag: &StartTag<'_>, links: &R, out: &mut String) {
    let Some(id) = tag.attribute(REF_ATTRIBUTE) else {
        out.push_str(tag.raw);
        return;
    };

    if let Some(url) = links.resolve_link(id) {
        out.push_str("<img");
        push_attributes(out, tag, &["src", REF_ATTRIBUTE, "data-type"]);
        push_attribute(out, "src", &url);
        out.push_str(if tag.self_closing { " />" } else { ">" });
    } else {
        tracing::debug!(reference = id, "rich-text image did not resolve");
        push_inert(out, id);
        out.push_str("</span>");
    }
}

/// Character data can only hold a `<` that failed to open markup.
fn push_text(out: &mut String, text: &str) {
    for (i, part) in text.split('<').enumerate() {
        if i > 0 {
            out.push_str("&lt;");
        }
        out.push_str(part);
    }
}

fn push_inert(out: &mut String, id: &str) {
    out.push_str("<span");
    push_attribute(out, UNRESOLVED_ATTRIBUTE, id);
    out.push('>');
}

fn push_attributes(out: &mut String, tag: &StartTag<'_>, skip: &[&str]) {
    for Attribute { name, value } in &tag.attributes {
        if skip.contains(&name.as_str()) {
            continue;
        }
        match value {
            Some(value) => push_attribute(out, name, value),
            None => {
                out.push(' ');
                out.push_str(name);
            }
        }
    }
}

/// Append ` name="value"`, escaping the value for a double-quoted attribute.
fn push_attribute(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {name}=\"");
    for c in value.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out.push('"');
}
