//! Commerce session handles and their cache.
//!
//! A handle is identified by its [`SessionKey`]. The [`SessionCache`] keeps
//! the handle built for the most recent key and hands the same instance back
//! as long as the key compares equal, so repeated renders with unchanged
//! configuration do not redo session setup.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::AnonymousCredentials;

/// Default commerce request timeout.
const TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for commerce session construction.
#[derive(Debug, Error)]
pub enum SessionConstructionError {
    /// The service URL cannot be parsed.
    #[error("invalid commerce service URL '{url}': {reason}")]
    ServiceUrl {
        /// Offending URL.
        url: String,
        /// Parse failure.
        reason: String,
    },
    /// A default request header has an invalid name.
    #[error("invalid commerce request header name '{0}'")]
    HeaderName(String),
    /// A default request header has an invalid value.
    #[error("invalid value for commerce request header '{0}'")]
    HeaderValue(String),
    /// The HTTP client could not be built.
    #[error("failed to create commerce HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Structural identity of a commerce session.
///
/// Two keys are equal when every component is equal; header order is
/// irrelevant because headers are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Commerce service endpoint.
    pub service_url: String,
    /// Connector identity.
    pub connector: String,
    /// Account/environment id.
    pub account_env_id: String,
    /// Default request headers.
    pub request_headers: BTreeMap<String, String>,
    /// Anonymous-credential policy.
    pub anonymous_credentials: Option<AnonymousCredentials>,
}

/// A commerce session handle shared by every node of a render.
#[derive(Debug)]
pub struct CommerceClient {
    key: SessionKey,
    service_url: Url,
    http: Client,
}

impl CommerceClient {
    /// Build a session handle for `key`.
    ///
    /// No request is sent; this only prepares the HTTP client with the
    /// session's default headers.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionConstructionError`] if the service URL or a default
    /// header is invalid, or the HTTP client cannot be built.
    pub fn connect(key: SessionKey) -> Result<Self, SessionConstructionError> {
        let service_url =
            Url::parse(&key.service_url).map_err(|e| SessionConstructionError::ServiceUrl {
                url: key.service_url.clone(),
                reason: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &key.request_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| SessionConstructionError::HeaderName(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| SessionConstructionError::HeaderValue(name.clone()))?;
            let _ = headers.insert(header_name, header_value);
        }

        let http = Client::builder()
            .timeout(TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(SessionConstructionError::Client)?;

        tracing::debug!(
            service_url = %service_url,
            connector = %key.connector,
            account_env_id = %key.account_env_id,
            "commerce session handle created"
        );
        Ok(Self {
            key,
            service_url,
            http,
        })
    }

    /// The key this handle was built for.
    #[must_use]
    pub const fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Parsed commerce service endpoint.
    #[must_use]
    pub const fn service_url(&self) -> &Url {
        &self.service_url
    }

    /// Connector identity.
    #[must_use]
    pub fn connector(&self) -> &str {
        &self.key.connector
    }

    /// Account/environment id.
    #[must_use]
    pub fn account_env_id(&self) -> &str {
        &self.key.account_env_id
    }

    /// Credentials for anonymous sessions, if configured.
    #[must_use]
    pub const fn anonymous_credentials(&self) -> Option<&AnonymousCredentials> {
        self.key.anonymous_credentials.as_ref()
    }

    /// HTTP client preconfigured with the session's default headers.
    #[must_use]
    pub const fn http(&self) -> &Client {
        &self.http
    }
}

/// Single-slot cache of the most recently built session handle.
#[derive(Debug, Default)]
pub struct SessionCache {
    current: Option<Arc<CommerceClient>>,
}

impl SessionCache {
    /// Return the cached handle if its key equals `key`, otherwise build,
    /// cache and return a new one.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionConstructionError`] if a new handle is needed and
    /// cannot be built. The previously cached handle is kept in that case.
    pub fn get_or_connect(
        &mut self,
        key: &SessionKey,
    ) -> Result<Arc<CommerceClient>, SessionConstructionError> {
        if let Some(client) = self.current.as_ref().filter(|c| c.key() == key) {
            tracing::debug!(reused = true, "commerce session handle");
            return Ok(Arc::clone(client));
        }
        let client = Arc::new(CommerceClient::connect(key.clone())?);
        tracing::debug!(reused = false, "commerce session handle");
        self.current = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Adopt a handle built elsewhere (e.g. supplied by the caller).
    pub fn adopt(&mut self, client: Arc<CommerceClient>) {
        self.current = Some(client);
    }

    /// The currently cached handle.
    #[must_use]
    pub const fn current(&self) -> Option<&Arc<CommerceClient>> {
        self.current.as_ref()
    }
}
