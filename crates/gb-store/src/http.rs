//! Response interpretation for the two Neocities round trips.
//!
//! Keeps the status and body handling for the document fetch and the upload
//! reply in one place so [`crate::NeocitiesStore`] only sequences requests.

use gb_core::{EntryCollection, ParsedDocument, parse_document};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::StoreError;

/// Turn a document fetch response into a collection.
///
/// - **404** → empty collection (document not created yet).
/// - **Other non-2xx** → [`StoreError::Upstream`].
/// - **2xx** → body handed to [`document_from_body`].
pub async fn read_document(resp: reqwest::Response) -> Result<EntryCollection, StoreError> {
    let status = resp.status();
    let url = resp.url().to_string();

    if status == StatusCode::NOT_FOUND {
        tracing::warn!(url = %url, "remote document not found; using empty collection");
        return Ok(EntryCollection::new());
    }
    if !status.is_success() {
        return Err(StoreError::Upstream {
            status: status.as_u16(),
            url,
        });
    }

    let body = resp.text().await.map_err(StoreError::Transient)?;
    document_from_body(&body)
}

/// Parse a 2xx document body.
pub fn document_from_body(body: &str) -> Result<EntryCollection, StoreError> {
    match parse_document(body).map_err(|e| StoreError::Parse(e.to_string()))? {
        ParsedDocument::Empty => {
            tracing::warn!("remote document is empty; using empty collection");
            Ok(EntryCollection::new())
        }
        ParsedDocument::Records(collection) => {
            let skipped = collection.foreign_count();
            if skipped > 0 {
                tracing::warn!(skipped, "remote document holds records that are not entries");
            }
            tracing::debug!(records = collection.len(), "remote document loaded");
            Ok(collection)
        }
        ParsedDocument::NotAnArray(kind) => Err(StoreError::UnexpectedShape(kind)),
    }
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    #[serde(default)]
    result: String,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Check the upload API reply.
///
/// Success needs a 2xx status and `"result": "success"`. Rejections with
/// 401/403 or `error_type = "invalid_auth"` map to [`StoreError::Auth`];
/// everything else maps to [`StoreError::Upload`].
pub fn check_upload_reply(status: u16, body: &str) -> Result<(), StoreError> {
    let reply = serde_json::from_str::<UploadReply>(body).ok();

    if (200..300).contains(&status) && reply.as_ref().is_some_and(|r| r.result == "success") {
        return Ok(());
    }

    let auth_rejected = matches!(status, 401 | 403)
        || reply
            .as_ref()
            .and_then(|r| r.error_type.as_deref())
            .is_some_and(|t| t == "invalid_auth");
    let message = reply
        .and_then(|r| r.message)
        .unwrap_or_else(|| format!("upload rejected with status {status}"));

    if auth_rejected {
        Err(StoreError::Auth(message))
    } else {
        Err(StoreError::Upload(message))
    }
}
