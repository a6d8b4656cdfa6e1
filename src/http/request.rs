//! Outgoing request descriptor.

use serde_json::Value;

use super::{Headers, Method};

/// An outgoing HTTP request as seen by the interceptor chain.
///
/// The URL is kept apart from the extra query parameters so both the bare
/// URL and [`url_with_params`](Self::url_with_params) are available, the
/// same way the transfer cache fingerprints them.
///
/// # Examples
///
/// ```
/// use rttp_handoff::http::{Method, Request};
///
/// let request = Request::get("https://api.example.com/items")
///     .param("page", "2")
///     .header("Accept", "application/json");
///
/// assert_eq!(request.method(), &Method::Get);
/// assert_eq!(request.url_with_params(), "https://api.example.com/items?page=2");
/// assert_eq!(request.headers().get("accept"), Some("application/json"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    url: String,
    params: Vec<(String, String)>,
    headers: Headers,
    body: Option<Value>,
}

impl Request {
    /// Creates a request with no headers, params or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Shorthand for `Request::new(Method::Get, url)`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Shorthand for `Request::new(Method::Post, url)`.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Appends a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a query parameter. Order of insertion is preserved.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the URL without the extra query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the URL with every extra parameter appended.
    ///
    /// Names and values are percent-encoded. Uses `?` as the separator unless
    /// the URL already carries a query, in which case `&` is used.
    pub fn url_with_params(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }

        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if !self.url.contains('?') {
            "?"
        } else if self.url.ends_with('?') || self.url.ends_with('&') {
            ""
        } else {
            "&"
        };

        format!("{}{}{}", self.url, separator, query)
    }
}
