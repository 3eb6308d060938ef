//! Shared runtime context for the Vitrine page composer.
//!
//! # Scope
//!
//! This crate provides:
//! - **Configuration** - the per-render configuration and its validation
//! - **Commerce Sessions** - session handles keyed by a structural
//!   [`SessionKey`] and reused while the key is unchanged
//! - **Cookies** - a read-only cookie snapshot and the single-writer consent slot
//! - **Runtime Context** - the bundle threaded, by reference, to every node
//!
//! # Not Yet Implemented
//!
//! - Commerce requests (the handle only prepares the HTTP client)

pub mod config;
pub mod cookies;
pub mod session;

use std::sync::Arc;

use thiserror::Error;

pub use config::{AnonymousCredentials, CommerceConfig, Configuration, ConfigurationError};
pub use cookies::{CONSENT_COOKIE, ConsentSlot, ConsentState, ConsentWriter, CookieSnapshot};
pub use session::{CommerceClient, SessionCache, SessionConstructionError, SessionKey};

/// Error type for context construction.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The configuration is malformed.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The commerce session handle could not be built.
    #[error(transparent)]
    Session(#[from] SessionConstructionError),
}

/// Tracking parameters consumed by the pixel collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Discovery account id.
    pub account_id: Option<String>,
    /// Discovery domain key.
    pub domain_key: Option<String>,
    /// Discovery view id.
    pub view_id: Option<String>,
}

impl TrackingConfig {
    /// Extract the tracking parameters from the commerce configuration.
    #[must_use]
    pub fn from_commerce(commerce: &CommerceConfig) -> Self {
        Self {
            account_id: commerce.discovery_account_id.clone(),
            domain_key: commerce.discovery_domain_key.clone(),
            view_id: commerce.discovery_view_id.clone(),
        }
    }

    /// Tracking needs both an account id and a domain key.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.account_id.is_some() && self.domain_key.is_some()
    }
}

/// Render-scoped context shared by every node of one render tree.
///
/// Immutable once built except for the consent slot.
#[derive(Debug)]
pub struct RuntimeContext {
    commerce: Arc<CommerceClient>,
    cookies: CookieSnapshot,
    tracking: TrackingConfig,
    configuration: Configuration,
    consent: Arc<ConsentSlot>,
}

impl RuntimeContext {
    /// Commerce session handle.
    #[must_use]
    pub const fn commerce(&self) -> &Arc<CommerceClient> {
        &self.commerce
    }

    /// Cookies of the incoming request.
    #[must_use]
    pub const fn cookies(&self) -> &CookieSnapshot {
        &self.cookies
    }

    /// Tracking parameters.
    #[must_use]
    pub const fn tracking(&self) -> &TrackingConfig {
        &self.tracking
    }

    /// Page-wide configuration.
    #[must_use]
    pub const fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Latest consent state (reads the slot, never a cached copy).
    #[must_use]
    pub fn consent(&self) -> ConsentState {
        self.consent.get()
    }

    /// Whether tracking may run: configured and consented.
    #[must_use]
    pub fn tracking_allowed(&self) -> bool {
        self.tracking.is_enabled() && self.consent() == ConsentState::Accepted
    }

    /// The consent slot's writer; `Some` only on the first call.
    #[must_use]
    pub fn consent_writer(&self) -> Option<ConsentWriter> {
        ConsentSlot::writer(&self.consent)
    }
}

/// Builds runtime contexts, reusing commerce session handles across renders.
#[derive(Debug, Default)]
pub struct ContextPropagator {
    sessions: SessionCache,
}

impl ContextPropagator {
    /// A propagator with an empty session cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the runtime context for one render.
    ///
    /// `existing` is a handle the caller already holds; it is reused when its
    /// key equals the configuration's session key. Otherwise the cached handle
    /// is reused when its key is equal, and a new handle is built only when the
    /// key changed.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Configuration`] if the configuration is
    /// malformed and [`ContextError::Session`] if a new session handle cannot
    /// be built.
    pub fn build_context(
        &mut self,
        configuration: &Configuration,
        cookies: CookieSnapshot,
        existing: Option<&Arc<CommerceClient>>,
    ) -> Result<Arc<RuntimeContext>, ContextError> {
        configuration.validate()?;
        let key = configuration.session_key();

        let commerce = match existing.filter(|client| client.key() == &key) {
            Some(client) => {
                tracing::debug!(reused = true, "using caller-supplied commerce session handle");
                self.sessions.adopt(Arc::clone(client));
                Arc::clone(client)
            }
            None => self.sessions.get_or_connect(&key)?,
        };

        let consent = Arc::new(ConsentSlot::new(cookies.consent()));
        Ok(Arc::new(RuntimeContext {
            commerce,
            tracking: TrackingConfig::from_commerce(&configuration.commerce),
            configuration: configuration.clone(),
            cookies,
            consent,
        }))
    }

    /// The session cache.
    #[must_use]
    pub const fn sessions(&self) -> &SessionCache {
        &self.sessions
    }
}
