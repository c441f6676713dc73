use thiserror::Error;

/// Template parameters could not be turned into rule logic.
///
/// Always carries at least one message; nothing is built when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .errors.join("; "))]
pub struct BuildError {
    pub errors: Vec<String>,
}

impl BuildError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.errors
    }
}

/// Compressed payloads that cannot be turned back into JSON.
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("Failed to compress: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to decompress - wrapper is not valid JSON: {0}")]
    Wrapper(#[source] serde_json::Error),

    #[error("Failed to decompress - missing compressedValue in wrapper")]
    MissingValue,

    #[error("Failed to decompress - invalid compressed value")]
    InvalidValue,

    #[error("Failed to decompress - payload is not valid JSON: {0}")]
    Payload(#[source] serde_json::Error),
}
