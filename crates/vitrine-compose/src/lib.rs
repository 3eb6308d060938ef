//! Render-tree composition for the Vitrine page composer.
//!
//! # Scope
//!
//! This crate provides:
//! - **Mapping Registry** - validated type-label to renderer table
//! - **Content Resolution** - three-way field lookups against the snapshot
//! - **Tree Composition** - the depth-first walk producing [`RenderNode`]s
//!
//! # Example
//!
//! ```ignore
//! let registry = MappingRegistry::storefront();
//! let tree = compose(snapshot.root(), &snapshot, &registry, &context);
//! tree.print_tree();
//! ```

pub mod composer;
pub mod registry;
pub mod render;
pub mod resolver;

pub use composer::{compose, compose_path};
pub use registry::{
    ComponentKind, ContainerLayout, Lookup, MappingRegistry, MappingRegistryBuilder, Renderer,
};
pub use render::{Prop, Props, RenderNode, RenderTarget, ResolvedDocument};
pub use resolver::{ContentResolver, FieldLookup, ItemContent};
