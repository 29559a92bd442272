use crate::errors::{ArbiterError, Result};

/// Serializes a value to pretty JSON (two-space indentation).
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| ArbiterError::SerializationError(err.to_string()))
}

/// Deserializes a JSON string into the provided type with shared error semantics.
pub fn from_json_str<T: serde::de::DeserializeOwned>(input: &str) -> Result<T> {
    serde_json::from_str(input).map_err(|err| ArbiterError::DeserializationError(err.to_string()))
}

/// Deserializes JSON bytes.
pub fn from_json_bytes<T: serde::de::DeserializeOwned>(input: &[u8]) -> Result<T> {
    serde_json::from_slice(input).map_err(|err| ArbiterError::DeserializationError(err.to_string()))
}
