//! Shapes written to the transfer store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{
    ErrorResponse, Headers, HttpError, Response, StatusCode, headers::HeaderMultimap,
};

/// One completed request's outcome, as handed from server to client.
///
/// Exactly one of `body` / `error` is meaningful; which one is decided by
/// `status` alone (>= 400 is an error), never by which field is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default)]
    pub headers: HeaderMultimap,
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub url: String,
}

impl CachedEntry {
    /// Captures a successful response.
    pub fn from_response(response: &Response) -> Self {
        Self {
            body: Some(response.body().clone()),
            error: None,
            headers: response.headers().to_multimap(),
            status: response.status().as_u16(),
            status_text: response.status_text().to_owned(),
            url: response.url().to_owned(),
        }
    }

    /// Captures an upstream error response.
    pub fn from_error(error: &ErrorResponse) -> Self {
        Self {
            body: None,
            error: Some(error.error().clone()),
            headers: error.headers().to_multimap(),
            status: error.status().as_u16(),
            status_text: error.status_text().to_owned(),
            url: error.url().to_owned(),
        }
    }

    /// Rebuilds the outcome this entry was captured from.
    pub fn replay(self) -> Result<Response, HttpError> {
        let status = StatusCode::from(self.status);
        let headers = Headers::from_multimap(&self.headers);

        if status.is_error() {
            return Err(HttpError::Status(
                ErrorResponse::new(status)
                    .with_error(self.error.unwrap_or(Value::Null))
                    .with_headers(headers)
                    .with_status_text(self.status_text)
                    .with_url(self.url),
            ));
        }

        Ok(Response::new(status)
            .with_body(self.body.unwrap_or(Value::Null))
            .with_headers(headers)
            .with_status_text(self.status_text)
            .with_url(self.url))
    }
}

/// Bookkeeping row correlating a request fingerprint with the occurrence id
/// the server assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStateRecord {
    pub id: u64,
    #[serde(rename = "reqKey")]
    pub req_key: String,
}
