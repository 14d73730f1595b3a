//! Entry store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or rewriting the remote document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Credentials are missing or were rejected by Neocities.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Neocities refused or failed the upload.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The document URL answered with a status other than 2xx or 404.
    #[error("unexpected status {status} when fetching {url}")]
    Upstream {
        /// HTTP status code returned by the site.
        status: u16,
        url: String,
    },

    /// The document body is not valid JSON.
    #[error("failed to parse remote document: {0}")]
    Parse(String),

    /// The document is valid JSON but not an array.
    #[error("remote document is a JSON {0}, expected an array")]
    UnexpectedShape(&'static str),

    /// Network-level failure or timeout while fetching the document.
    #[error("failed to fetch remote document: {0}")]
    Transient(#[source] reqwest::Error),

    /// The local staging copy could not be written.
    #[error("failed to write staging file {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The collection could not be serialized.
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),
}
