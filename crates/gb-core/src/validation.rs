//! Append request validation.
//!
//! The body must be a JSON object whose `spot1`, `spot2` and `spot3` are all
//! present and all strings. Empty strings are accepted. Other keys are ignored.

use serde_json::{Map, Value};

use crate::entry::Spots;
use crate::errors::CoreError;

const SPOT_FIELDS: [&str; 3] = ["spot1", "spot2", "spot3"];

/// Parse and validate a raw append request body.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] naming the first offending field, or
/// describing why the body is not an object.
pub fn parse_spots(body: &[u8]) -> Result<Spots, CoreError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CoreError::Validation(
            "request body must be a JSON object with spot1, spot2 and spot3".into(),
        ));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| CoreError::Validation(format!("request body is not valid JSON: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(CoreError::Validation("request body must be a JSON object".into()));
    };

    let [spot1, spot2, spot3] = SPOT_FIELDS.map(|name| string_field(&fields, name));
    Ok(Spots {
        spot1: spot1?,
        spot2: spot2?,
        spot3: spot3?,
    })
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Result<String, CoreError> {
    match fields.get(name) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Err(CoreError::Validation(format!("{name} is required"))),
        Some(_) => Err(CoreError::Validation(format!("{name} must be a string"))),
    }
}
