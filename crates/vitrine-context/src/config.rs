//! Render configuration.
//!
//! The configuration is supplied by the hosting application for every render.
//! Its commerce section determines the identity of the commerce session
//! ([`SessionKey`]); the rest is page-wide configuration threaded to every
//! node through the runtime context.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionKey;

/// Error type for malformed render configuration.
///
/// Raised before any tree walk begins; a render never proceeds past one.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Failed to read a configuration file.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The configuration is not valid JSON or lacks required keys.
    #[error("malformed configuration: {0}")]
    Decode(#[from] serde_json::Error),
    /// A required field is present but empty.
    #[error("configuration field '{0}' must not be empty")]
    EmptyField(&'static str),
    /// A URL field does not hold an absolute http(s) URL.
    #[error("configuration field '{field}' is not an http(s) URL: '{value}'")]
    InvalidUrl {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// Two renderers were registered for the same type label.
    #[error("duplicate renderer mapping for type label '{0}'")]
    DuplicateTypeLabel(String),
}

/// Credentials used for anonymous commerce sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnonymousCredentials {
    /// Anonymous user name.
    pub username: String,
    /// Anonymous password.
    pub password: String,
}

/// Commerce connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceConfig {
    /// Commerce GraphQL service endpoint.
    pub graphql_service_url: String,
    /// Connector identity (e.g. `brsm`).
    pub connector: String,
    /// Account/environment id.
    #[serde(alias = "brAccountName")]
    pub account_env_id: String,
    /// Headers sent with every commerce request.
    #[serde(default)]
    pub default_request_headers: Option<BTreeMap<String, String>>,
    /// Credentials for anonymous sessions.
    #[serde(default)]
    pub anonymous_credentials: Option<AnonymousCredentials>,
    /// Discovery account id (tracking pixel).
    #[serde(default)]
    pub discovery_account_id: Option<String>,
    /// Discovery domain key (tracking pixel).
    #[serde(default)]
    pub discovery_domain_key: Option<String>,
    /// Discovery view id (tracking pixel).
    #[serde(default)]
    pub discovery_view_id: Option<String>,
}

/// Configuration for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Page-model API endpoint the snapshot was fetched from.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Site base used to absolutize relative document links.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request path; scopes the consent banner.
    #[serde(default)]
    pub path: Option<String>,
    /// Commerce connector settings.
    pub commerce: CommerceConfig,
}

impl Configuration {
    /// Decode a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Decode`] if the text is not a configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and decode a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Read`] if the file cannot be read and
    /// [`ConfigurationError::Decode`] if it is not a configuration.
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Check the fields that determine commerce-session identity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidUrl`] for a service URL (or
    /// endpoint/base URL, when given) that is not absolute http(s), and
    /// [`ConfigurationError::EmptyField`] for an empty connector or account id.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_http_url("commerce.graphqlServiceUrl", &self.commerce.graphql_service_url)?;
        if let Some(endpoint) = &self.endpoint {
            check_http_url("endpoint", endpoint)?;
        }
        if let Some(base_url) = &self.base_url {
            check_http_url("baseUrl", base_url)?;
        }
        if self.commerce.connector.trim().is_empty() {
            return Err(ConfigurationError::EmptyField("commerce.connector"));
        }
        if self.commerce.account_env_id.trim().is_empty() {
            return Err(ConfigurationError::EmptyField("commerce.accountEnvId"));
        }
        Ok(())
    }

    /// The tuple that identifies a commerce session.
    #[must_use]
    pub fn session_key(&self) -> SessionKey {
        SessionKey {
            service_url: self.commerce.graphql_service_url.clone(),
            connector: self.commerce.connector.clone(),
            account_env_id: self.commerce.account_env_id.clone(),
            request_headers: self.commerce.default_request_headers.clone().unwrap_or_default(),
            anonymous_credentials: self.commerce.anonymous_credentials.clone(),
        }
    }
}

fn check_http_url(field: &'static str, value: &str) -> Result<(), ConfigurationError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigurationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
