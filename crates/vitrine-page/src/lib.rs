//! High-level page rendering API for the Vitrine page composer.
//!
//! # Scope
//!
//! This crate provides:
//! - **Page Loading** - read and decode a page model into a snapshot
//! - **Render Pipeline** - registry construction, context construction
//!   (which validates the configuration) and composition, in that order
//!
//! Each [`render_page`] call starts with a fresh set of deduplicated
//! warnings, so an unmapped type label is reported once per render.
//!
//! # Not Yet Implemented
//!
//! - Fetching the page model from the delivery API (`endpoint`)
//! - Commerce data requests

pub use vitrine_compose as compose;
pub use vitrine_context as context;
pub use vitrine_model as model;

use std::fs;
use std::sync::Arc;

use thiserror::Error;
use vitrine_common::warning::clear_warnings;
use vitrine_compose::{MappingRegistry, RenderNode, Renderer, compose, compose_path};
use vitrine_context::{
    CommerceClient, Configuration, ConfigurationError, ContextError, ContextPropagator,
    CookieSnapshot, RuntimeContext,
};
use vitrine_model::{ModelError, PageSnapshot};

/// Error type for page loading and rendering.
///
/// Only configuration and session problems are errors; content problems
/// degrade inside the render tree.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The page model file could not be read.
    #[error("failed to read page model '{path}': {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The page model could not be decoded.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// The configuration or the type-label mapping is malformed.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The runtime context could not be built.
    #[error(transparent)]
    Context(ContextError),
}

impl From<ContextError> for RenderError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Configuration(err) => Self::Configuration(err),
            err @ ContextError::Session(_) => Self::Context(err),
        }
    }
}

/// Load a page model from a JSON file.
///
/// # Errors
///
/// Returns [`RenderError::Io`] if the file cannot be read and
/// [`RenderError::Model`] if it is not a valid page model.
pub fn load_page(path: &str) -> Result<PageSnapshot, RenderError> {
    let json = fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_string(),
        source,
    })?;
    let snapshot = PageSnapshot::from_json_str(&json)?;
    tracing::debug!(
        path,
        nodes = snapshot.len(),
        documents = snapshot.document_count(),
        "page model loaded"
    );
    Ok(snapshot)
}

/// Everything one render needs.
#[derive(Debug)]
pub struct RenderRequest {
    /// The page model, already fetched.
    pub snapshot: PageSnapshot,
    /// Page-wide configuration.
    pub configuration: Configuration,
    /// Cookies of the incoming request.
    pub cookies: CookieSnapshot,
    /// Slot path to compose instead of the whole page.
    pub path: Option<String>,
    /// Session handle the caller already holds.
    pub commerce: Option<Arc<CommerceClient>>,
    /// Labels mapped in addition to the storefront defaults.
    pub extra_mappings: Vec<(String, Renderer)>,
}

impl RenderRequest {
    /// A request for the whole page with no cookies.
    #[must_use]
    pub fn new(snapshot: PageSnapshot, configuration: Configuration) -> Self {
        Self {
            snapshot,
            configuration,
            cookies: CookieSnapshot::empty(),
            path: None,
            commerce: None,
            extra_mappings: Vec::new(),
        }
    }

    /// Builder-style cookie assignment.
    #[must_use]
    pub fn with_cookies(mut self, cookies: CookieSnapshot) -> Self {
        self.cookies = cookies;
        self
    }

    /// Compose only the sub-tree at `path`.
    #[must_use]
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Offer an existing commerce session handle for reuse.
    #[must_use]
    pub fn with_commerce(mut self, client: Arc<CommerceClient>) -> Self {
        self.commerce = Some(client);
        self
    }

    /// Map an additional type label.
    #[must_use]
    pub fn map(mut self, label: impl Into<String>, renderer: Renderer) -> Self {
        self.extra_mappings.push((label.into(), renderer));
        self
    }
}

/// Result of one render.
#[derive(Debug)]
pub struct RenderedPage {
    /// The composed tree; `None` if the requested path does not exist.
    pub tree: Option<RenderNode>,
    /// The context every node of `tree` shares.
    pub context: Arc<RuntimeContext>,
}

/// Render one page.
///
/// The registry is built and the configuration validated before the walk
/// starts, so the walk itself never fails. `propagator` carries the session
/// cache from one render to the next. Warnings recorded by earlier renders
/// are cleared first.
///
/// # Errors
///
/// Returns [`RenderError::Configuration`] for a malformed configuration or a
/// duplicate type label, and [`RenderError::Context`] if the commerce session
/// handle cannot be built.
pub fn render_page(
    request: RenderRequest,
    propagator: &mut ContextPropagator,
) -> Result<RenderedPage, RenderError> {
    let RenderRequest {
        snapshot,
        configuration,
        cookies,
        path,
        commerce,
        extra_mappings,
    } = request;

    clear_warnings();

    let registry = extra_mappings
        .into_iter()
        .fold(MappingRegistry::builder().storefront_defaults(), |builder, (label, renderer)| {
            builder.map(label, renderer)
        })
        .build()?;

    let context = propagator.build_context(&configuration, cookies, commerce.as_ref())?;
    let snapshot = snapshot.with_base_url(configuration.base_url.clone());

    let tree = match path.as_deref() {
        Some(path) => compose_path(path, &snapshot, &registry, &context),
        None => Some(compose(snapshot.root(), &snapshot, &registry, &context)),
    };
    tracing::debug!(
        path = path.as_deref().unwrap_or("/"),
        nodes = tree.as_ref().map_or(0, |tree| tree.walk().count()),
        "page composed"
    );

    Ok(RenderedPage { tree, context })
}
