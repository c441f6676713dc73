use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{CoreError, Result};

/// Serializes a value to pretty JSON with canonical error handling.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| CoreError::Serialization(err.to_string()))
}

/// Deserializes a JSON string into the provided type with shared error semantics.
pub fn from_json_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    serde_json::from_str(input).map_err(|err| CoreError::Deserialization(err.to_string()))
}

/// Deserializes a YAML string.
pub fn from_yaml_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    serde_yaml::from_str(input).map_err(|err| CoreError::Deserialization(err.to_string()))
}
