//! Request fingerprints and store keys.
//!
//! A *fingerprint* is the SHA-256 of a deterministic JSON rendering of the
//! request (method, URLs, headers, body). It does not depend on how many
//! times the request has been issued. The *store key* for one occurrence is
//! `sha256(fingerprint + "_" + id)`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::CacheError;
use crate::{config::TransferCacheConfig, http::Request};

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

/// Replaces the authority of `url` with `host`, keeping the scheme, path,
/// query and fragment.
///
/// # Errors
///
/// [`CacheError::MalformedUrl`] when `url` has no `://`.
///
/// # Examples
///
/// ```
/// use rttp_handoff::cache::key::replace_host;
///
/// let url = replace_host("https://public.example.com/y?x=1", "internal.local").unwrap();
/// assert_eq!(url, "https://internal.local/y?x=1");
/// ```
pub fn replace_host(url: &str, host: &str) -> Result<String, CacheError> {
    let (scheme, rest) = url.split_once("://").ok_or_else(|| CacheError::MalformedUrl {
        url: url.to_owned(),
    })?;
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Ok(format!("{scheme}://{host}{}", &rest[authority_end..]))
}

fn strip_scheme(url: &str) -> &str {
    url.split_once("://").map_or(url, |(_, rest)| rest)
}

/// What actually gets hashed. Field order is fixed by the struct, and every
/// map is a `BTreeMap`, so the JSON rendering is stable.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedRequest<'a> {
    method: &'a str,
    url: String,
    url_with_params: String,
    headers: BTreeMap<String, Vec<&'a str>>,
    body: Option<&'a Value>,
}

/// Derives fingerprints and store keys from requests.
///
/// # Examples
///
/// ```
/// use rttp_handoff::cache::KeyGenerator;
/// use rttp_handoff::config::TransferCacheConfig;
/// use rttp_handoff::http::Request;
///
/// let keys = KeyGenerator::new(&TransferCacheConfig::default());
/// let request = Request::get("https://api.example.com/x");
///
/// let first = keys.compute_key(&request, 1).unwrap();
/// assert_eq!(first, keys.compute_key(&request, 1).unwrap());
/// assert_ne!(first, keys.compute_key(&request, 2).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyGenerator {
    override_host_header: Option<String>,
    skip_url_scheme: bool,
}

impl KeyGenerator {
    pub fn new(config: &TransferCacheConfig) -> Self {
        Self {
            override_host_header: config.override_host_header_name.clone(),
            skip_url_scheme: config.skip_url_scheme,
        }
    }

    /// Fingerprint of `request`, independent of its occurrence id.
    ///
    /// With an override header configured, the header's last value replaces
    /// the host of both the URL and the URL with params, and the header
    /// itself is left out of the hashed header set.
    ///
    /// # Errors
    ///
    /// - [`CacheError::MissingKeyHeader`]: the override header is absent or its last value is empty.
    /// - [`CacheError::MalformedUrl`]: a URL has no scheme separator.
    pub fn fingerprint(&self, request: &Request) -> Result<String, CacheError> {
        let mut url = request.url().to_owned();
        let mut url_with_params = request.url_with_params();

        if let Some(header) = &self.override_host_header {
            let host = request
                .headers()
                .last(header)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| CacheError::MissingKeyHeader {
                    header: header.clone(),
                })?;
            url = replace_host(&url, host)?;
            url_with_params = replace_host(&url_with_params, host)?;
        }

        if self.skip_url_scheme {
            url = strip_scheme(&url).to_owned();
            url_with_params = strip_scheme(&url_with_params).to_owned();
        }

        let mut headers: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for (name, value) in request.headers().iter() {
            if self
                .override_host_header
                .as_deref()
                .is_some_and(|h| h.eq_ignore_ascii_case(name))
            {
                continue;
            }
            headers
                .entry(name.to_ascii_lowercase())
                .or_default()
                .push(value);
        }

        let normalized = NormalizedRequest {
            method: request.method().as_str(),
            url,
            url_with_params,
            headers,
            body: request.body(),
        };
        let serialized = serde_json::to_vec(&normalized).map_err(CacheError::Fingerprint)?;
        Ok(sha256_hex(serialized))
    }

    /// Store key for one occurrence of an already fingerprinted request.
    pub fn entry_key(fingerprint: &str, occurrence_id: u64) -> String {
        sha256_hex(format!("{fingerprint}_{occurrence_id}"))
    }

    /// Store key for occurrence `occurrence_id` of `request`.
    pub fn compute_key(&self, request: &Request, occurrence_id: u64) -> Result<String, CacheError> {
        Ok(Self::entry_key(&self.fingerprint(request)?, occurrence_id))
    }
}
