//! Structural validation of the normalised reply.

use crate::error::AnalysisError;
use serde_json::{Map, Value};
use tracing::warn;

/// Check that `value` is a JSON object containing every key in `required`.
///
/// Only presence is checked; the shape of each section is left to the
/// presentation layer. A value that is not an object is missing every key;
/// with nothing required it yields an empty map.
/// On failure the error lists the missing keys in `required` order and keeps
/// `raw` for diagnostics.
pub fn validate_structure(
    value: Value,
    required: &[&str],
    raw: &str,
) -> Result<Map<String, Value>, AnalysisError> {
    let object = match value {
        Value::Object(map) => Some(map),
        _ => None,
    };

    let missing: Vec<String> = required
        .iter()
        .filter(|key| object.as_ref().map_or(true, |m| !m.contains_key(**key)))
        .map(|key| key.to_string())
        .collect();

    match (object, missing.is_empty()) {
        (Some(map), true) => Ok(map),
        // Nothing required and nothing usable: render as empty.
        (None, true) => Ok(Map::new()),
        (_, false) => {
            warn!("Reply is missing sections: {}", missing.join(", "));
            Err(AnalysisError::MissingSections {
                missing,
                raw: raw.to_string(),
            })
        }
    }
}
