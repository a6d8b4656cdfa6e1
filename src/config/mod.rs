//! Transfer cache options.

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading a [`TransferCacheConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid transfer cache config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("override host header name must not be blank")]
    BlankHeaderName,
}

/// What the server does when the same request fingerprint shows up twice
/// in one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePolicy {
    /// Record every occurrence under its own occurrence id; the client
    /// consumes them in issue order.
    #[default]
    Sequence,
    /// Fail the repeated request with `DuplicateRequestInPass`.
    Reject,
}

/// Caller-supplied options for the transfer cache.
///
/// Every field has a default, so partial JSON documents are accepted.
///
/// # Examples
///
/// ```
/// use rttp_handoff::config::{DuplicatePolicy, TransferCacheConfig};
///
/// let config = TransferCacheConfig::from_json_str(
///     r#"{ "productionMode": true, "overrideHostHeaderName": "X-Forwarded-Host" }"#,
/// )
/// .unwrap();
///
/// assert!(config.production_mode);
/// assert_eq!(config.override_host_header_name.as_deref(), Some("X-Forwarded-Host"));
/// assert_eq!(config.duplicate_requests, DuplicatePolicy::Sequence);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferCacheConfig {
    /// When `false` the cache switches itself off immediately, after one notice.
    pub production_mode: bool,
    /// Request header whose last value replaces the URL host before fingerprinting.
    pub override_host_header_name: Option<String>,
    /// Drop the `scheme://` prefix before fingerprinting.
    pub skip_url_scheme: bool,
    pub duplicate_requests: DuplicatePolicy,
}

impl Default for TransferCacheConfig {
    fn default() -> Self {
        Self {
            production_mode: true,
            override_host_header_name: None,
            skip_url_scheme: false,
            duplicate_requests: DuplicatePolicy::default(),
        }
    }
}

impl TransferCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a configured but blank override header name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.override_host_header_name {
            Some(name) if name.trim().is_empty() => Err(ConfigError::BlankHeaderName),
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn production_mode(mut self, enabled: bool) -> Self {
        self.production_mode = enabled;
        self
    }

    #[must_use]
    pub fn override_host_header(mut self, name: impl Into<String>) -> Self {
        self.override_host_header_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn skip_url_scheme(mut self, skip: bool) -> Self {
        self.skip_url_scheme = skip;
        self
    }

    #[must_use]
    pub fn duplicate_requests(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_requests = policy;
        self
    }
}
