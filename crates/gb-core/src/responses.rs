//! JSON bodies returned by the HTTP API.

use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// Response from `POST /api/{scene}-entry`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppendResponse {
    pub ok: bool,
    pub entry: Entry,
    /// Record count of the whole document after the append.
    pub total: usize,
}

impl AppendResponse {
    #[must_use]
    pub const fn new(entry: Entry, total: usize) -> Self {
        Self {
            ok: true,
            entry,
            total,
        }
    }
}

/// Body of every non-2xx API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Short machine-readable reason, e.g. `invalid_scene`.
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::errors::CoreError> for ErrorResponse {
    fn from(err: &crate::errors::CoreError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}
