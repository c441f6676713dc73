//! LZ-string encoding of rule logic for the `new_logic` transport field.
//!
//! The payload is the compact JSON text encoded with the "encoded URI
//! component" alphabet, wrapped as `{"compressedValue": .., "type": "compressedValue"}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::CompressionError;

pub const COMPRESSED_VALUE: &str = "compressedValue";

#[derive(Debug, Deserialize)]
struct Wrapper {
    #[serde(rename = "compressedValue", default)]
    compressed_value: Option<String>,
}

/// Size comparison between the JSON text and its encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStats {
    /// Bytes of compact JSON.
    pub original_size: usize,
    /// Bytes of the encoded payload, without the wrapper.
    pub compressed_size: usize,
    /// `compressed_size / original_size`.
    pub ratio: f64,
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<(String, String), CompressionError> {
    let json = serde_json::to_string(value).map_err(CompressionError::Serialize)?;
    let encoded = lz_str::compress_to_encoded_uri_component(json.as_str());
    Ok((json, encoded))
}

/// Wraps an already encoded payload.
pub fn wrap_compressed_value(encoded: &str) -> String {
    serde_json::json!({ COMPRESSED_VALUE: encoded, "type": COMPRESSED_VALUE }).to_string()
}

/// Serializes `value`, encodes it and returns the wrapper text.
pub fn compress<T: Serialize + ?Sized>(value: &T) -> Result<String, CompressionError> {
    let (json, encoded) = encode(value)?;
    debug!(
        original = json.len(),
        compressed = encoded.len(),
        "rule logic compressed"
    );
    Ok(wrap_compressed_value(&encoded))
}

/// Extracts the encoded payload from wrapper text.
pub fn get_compressed_value(wrapper: &str) -> Result<String, CompressionError> {
    let wrapper: Wrapper = serde_json::from_str(wrapper).map_err(CompressionError::Wrapper)?;
    wrapper
        .compressed_value
        .filter(|encoded| !encoded.is_empty())
        .ok_or(CompressionError::MissingValue)
}

/// Reverses [`compress`]. Never yields a value for a corrupt payload.
pub fn decompress(wrapper: &str) -> Result<Value, CompressionError> {
    let encoded = get_compressed_value(wrapper)?;
    let units = lz_str::decompress_from_encoded_uri_component(encoded.as_str())
        .filter(|units| !units.is_empty())
        .ok_or(CompressionError::InvalidValue)?;
    let json = String::from_utf16(&units).map_err(|_| CompressionError::InvalidValue)?;
    serde_json::from_str(&json).map_err(CompressionError::Payload)
}

pub fn compression_stats<T: Serialize + ?Sized>(value: &T) -> Result<CompressionStats, CompressionError> {
    let (json, encoded) = encode(value)?;
    let original_size = json.len();
    let compressed_size = encoded.len();
    let ratio = if original_size == 0 {
        0.0
    } else {
        compressed_size as f64 / original_size as f64
    };
    Ok(CompressionStats {
        original_size,
        compressed_size,
        ratio,
    })
}
