//! Success and error responses produced by a transport or replayed from the store.

use serde_json::Value;
use thiserror::Error;

use super::{Headers, StatusCode};

/// A successful HTTP response with a JSON body.
///
/// # Examples
///
/// ```
/// use rttp_handoff::http::{Response, StatusCode};
/// use serde_json::json;
///
/// let response = Response::new(StatusCode::OK)
///     .with_header("Content-Type", "application/json")
///     .with_body(json!({"status": "ok"}))
///     .with_url("https://api.example.com/health");
///
/// assert_eq!(response.status_text(), "OK");
/// assert_eq!(response.body(), &json!({"status": "ok"}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    status_text: String,
    headers: Headers,
    body: Value,
    url: String,
}

impl Response {
    /// Creates a response with the canonical status text and a `null` body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers: Headers::new(),
            body: Value::Null,
            url: String::new(),
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Sets the final resolved URL of the response.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// An upstream HTTP error response (status >= 400).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("http {status} for {url}")]
pub struct ErrorResponse {
    status: StatusCode,
    status_text: String,
    headers: Headers,
    error: Value,
    url: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers: Headers::new(),
            error: Value::Null,
            url: String::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Sets the error payload returned by the upstream.
    #[must_use]
    pub fn with_error(mut self, error: Value) -> Self {
        self.error = error;
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn error(&self) -> &Value {
        &self.error
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
