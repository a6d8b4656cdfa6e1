//! HTTP header map with case-insensitive name lookup.
//!
//! Besides lookups, the map converts to and from the grouped
//! `name -> [values]` form that cached entries are stored in.

use std::collections::BTreeMap;

/// Grouped header representation: one entry per name, values in arrival order.
pub type HeaderMultimap = BTreeMap<String, Vec<String>>;

/// A case-insensitive, multi-value HTTP header map.
///
/// Preserves insertion order and allows multiple values per header name.
///
/// # Examples
///
/// ```
/// use rttp_handoff::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("X-Forwarded-Host", "edge.local");
/// headers.insert("x-forwarded-host", "internal.local");
///
/// assert_eq!(headers.get("X-FORWARDED-HOST"), Some("edge.local"));
/// assert_eq!(headers.last("x-forwarded-host"), Some("internal.local"));
///
/// let grouped = headers.to_multimap();
/// assert_eq!(grouped["X-Forwarded-Host"], vec!["edge.local", "internal.local"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header entry. Multiple values for the same name are preserved.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first value for the given header name (case-insensitive), or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the last value for the given header name (case-insensitive), or `None`.
    pub fn last(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all values for the given header name (case-insensitive).
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes all entries with the given header name (case-insensitive).
    ///
    /// Returns `true` if any entries were removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.inner.len();
        self.inner.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.inner.len() < before
    }

    /// Returns `true` if the map contains at least one entry with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the total number of header entries (not unique names).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no header entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Groups values by header name.
    ///
    /// Names are matched case-insensitively; the spelling seen first is the
    /// one used as the key. Values keep their arrival order.
    pub fn to_multimap(&self) -> HeaderMultimap {
        let mut grouped = HeaderMultimap::new();
        for (name, value) in &self.inner {
            let key = grouped
                .keys()
                .find(|k| k.eq_ignore_ascii_case(name))
                .cloned()
                .unwrap_or_else(|| name.clone());
            grouped.entry(key).or_default().push(value.clone());
        }
        grouped
    }

    /// Rebuilds a header map from its grouped form.
    pub fn from_multimap(grouped: &HeaderMultimap) -> Self {
        let mut headers = Self::new();
        for (name, values) in grouped {
            for value in values {
                headers.insert(name.as_str(), value.as_str());
            }
        }
        headers
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}
