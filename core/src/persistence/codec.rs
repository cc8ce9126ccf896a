//! On-disk format: one JSON object mapping every key to its value

use crate::error::{StoreError, StoreResult};
use crate::value::{Document, Value};

/// Serialize the full store, two-space indented when `pretty` is set.
pub fn encode(documents: &Document, pretty: bool) -> StoreResult<Vec<u8>> {
    let encoded = if pretty {
        serde_json::to_vec_pretty(documents)
    } else {
        serde_json::to_vec(documents)
    };

    encoded.map_err(|e| StoreError::Serialization(format!("Failed to serialize database: {}", e)))
}

/// Parse stored contents.
///
/// Zero-length contents are an empty store. Anything else must be
/// a JSON object; a parse failure or another top-level shape is reported as
/// corruption rather than silently discarded.
pub fn decode(location: &str, bytes: &[u8]) -> StoreResult<Document> {
    if bytes.is_empty() {
        return Ok(Document::new());
    }

    let json: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
            location: location.to_string(),
            reason: e.to_string(),
        })?;

    match Value::from_json(json) {
        Value::Object(documents) => Ok(documents),
        other => Err(StoreError::Corrupt {
            location: location.to_string(),
            reason: format!("expected a top-level object, found {}", other.type_name()),
        }),
    }
}
