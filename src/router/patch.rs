//! Argument overlay and schema redaction for patched tools.

use serde_json::Value;

use crate::error::HostError;
use crate::types::{JsonObject, ToolPatch};

/// Normalize model-supplied arguments into an optional JSON object.
///
/// Accepts an object, `null`, or a string holding either.
pub fn coerce_arguments(value: Value) -> Result<Option<JsonObject>, HostError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let parsed: Value = serde_json::from_str(trimmed).map_err(|e| {
                HostError::InvalidArgument(format!("tool arguments must be valid JSON: {e}"))
            })?;
            coerce_arguments(parsed)
        }
        other => Err(HostError::InvalidArgument(format!(
            "tool arguments must be a JSON object; got {other}"
        ))),
    }
}

impl ToolPatch {
    /// Overlay the fixed inputs onto `arguments`.
    ///
    /// Keys are overwritten shallowly. Arguments that are absent, or that are
    /// not an object, are replaced by the patch itself when there is one.
    pub fn apply(&self, arguments: Value) -> Result<Option<JsonObject>, HostError> {
        let coerced = match coerce_arguments(arguments) {
            Ok(coerced) => coerced,
            Err(_) if !self.is_empty() => None,
            Err(error) => return Err(error),
        };

        if self.is_empty() {
            return Ok(coerced);
        }

        let mut merged = coerced.unwrap_or_default();
        for (key, value) in &self.input {
            merged.insert(key.clone(), value.clone());
        }
        Ok(Some(merged))
    }

    /// Remove patched fields from an input schema's `properties` and `required`.
    pub fn redact_schema(&self, schema: &mut Value) {
        if self.is_empty() {
            return;
        }
        if let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) {
            for key in self.input.keys() {
                properties.remove(key);
            }
        }
        if let Some(required) = schema.get_mut("required").and_then(Value::as_array_mut) {
            required.retain(|field| {
                field
                    .as_str()
                    .map_or(true, |name| !self.input.contains_key(name))
            });
        }
    }
}
