//! Small serde helpers for loosely typed upstream JSON.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept either a JSON string or a JSON number and keep it as text.
///
/// Station ids and line numbers show up as both across feed revisions.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}
