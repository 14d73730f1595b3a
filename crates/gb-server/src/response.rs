//! Transport-neutral responses and their conversion to `tiny_http`.

use std::io::Cursor;

use gb_core::{CoreError, ErrorResponse};
use serde::Serialize;
use tiny_http::Header;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// A response produced by [`crate::App::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    preflight: bool,
}

impl ApiResponse {
    #[must_use]
    pub const fn bytes(status: u16, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
            preflight: false,
        }
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::bytes(status, JSON, body),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize response body");
                Self::bytes(
                    500,
                    JSON,
                    br#"{"error":"internal","message":"response serialization failed"}"#.to_vec(),
                )
            }
        }
    }

    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self::bytes(status, TEXT, body.as_bytes().to_vec())
    }

    /// `{"error": code, "message": message}` with `status`.
    pub fn error(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self::json(status, &ErrorResponse::new(code, message))
    }

    /// A 400 for a request rejected before storage was touched.
    #[must_use]
    pub fn bad_request(err: &CoreError) -> Self {
        Self::json(400, &ErrorResponse::from(err))
    }

    /// Empty 204 answering a CORS preflight.
    #[must_use]
    pub const fn preflight() -> Self {
        Self {
            status: 204,
            content_type: TEXT,
            body: Vec::new(),
            preflight: true,
        }
    }

    /// Body parsed as JSON, for logging and tests.
    #[must_use]
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    fn headers(&self) -> Vec<(&'static str, &'static str)> {
        let mut headers = vec![("Access-Control-Allow-Origin", "*")];
        if self.preflight {
            headers.push(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"));
            headers.push(("Access-Control-Allow-Headers", "Content-Type"));
            headers.push(("Access-Control-Max-Age", "86400"));
        } else {
            headers.push(("Content-Type", self.content_type));
        }
        headers
    }

    pub(crate) fn into_tiny(self) -> tiny_http::Response<Cursor<Vec<u8>>> {
        let headers = self.headers();
        let mut response = tiny_http::Response::from_data(self.body).with_status_code(self.status);
        for (name, value) in headers {
            if let Some(header) = header(name, value) {
                response.add_header(header);
            }
        }
        response
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}
