//! Errors raised while interpreting requests against the entry model.
//!
//! Storage failures live in `gb-store`; these are the ones the router turns
//! into 4xx responses before storage is ever touched.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Path segment is not one of the scene symbols `a`..`j`.
    #[error("invalid scene '{0}': expected one of a-j")]
    InvalidScene(String),

    /// Request body is missing a field or has one of the wrong type.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Short machine-readable reason used as the `error` field of a response.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidScene(_) => "invalid_scene",
            Self::Validation(_) => "invalid_entry",
        }
    }
}
