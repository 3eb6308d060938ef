//! Rich-text handling for the Vitrine page composer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Markup Scanner** - a lossless split of markup into text, tags and
//!   opaque constructs
//! - **Rich Text Rewriter** - replaces internal `data-ref` markers on `<a>`
//!   and `<img>` with canonical document URLs
//!
//! # Not Yet Implemented
//!
//! - Character reference decoding
//! - Rewriting of `srcset`

/// Internal-link rewriting.
pub mod rewriter;
/// Lossless markup scanner.
pub mod scanner;

pub use rewriter::{LinkResolver, REF_ATTRIBUTE, UNRESOLVED_ATTRIBUTE, rewrite};
pub use scanner::{Attribute, MarkupScanner, Segment, StartTag, scan};
