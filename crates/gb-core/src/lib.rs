//! # gb-core
//!
//! Core types for the guestbook service.
//!
//! - The ten-symbol scene alphabet and the stored scene tag
//! - The entry record and id generation
//! - The remote document (`EntryCollection`) with scene views
//! - Append request validation
//! - API response bodies and request-level errors

pub mod collection;
pub mod entry;
pub mod errors;
pub mod responses;
pub mod scene;
pub mod validation;

pub use collection::{EntryCollection, ParsedDocument, Record, parse_document};
pub use entry::{Entry, Spots, now_millis};
pub use errors::CoreError;
pub use responses::{AppendResponse, ErrorResponse};
pub use scene::{Scene, SceneTag};
pub use validation::parse_spots;
