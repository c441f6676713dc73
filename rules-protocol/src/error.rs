use thiserror::Error;

/// Errors raised while decoding platform union objects.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("expected a JSON object for {context}")]
    NotAnObject { context: &'static str },
    #[error("unknown {context} type '{tag}' (expected one of: {expected})")]
    UnknownTag {
        context: &'static str,
        tag: String,
        expected: String,
    },
    #[error("{context} carries no recognised type (expected one of: {expected})")]
    Untagged {
        context: &'static str,
        expected: String,
    },
    #[error("{tag} is missing its '{field}' field")]
    MissingField { tag: String, field: &'static str },
    #[error("invalid {tag} payload: {source}")]
    Payload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    pub fn payload(tag: impl Into<String>, source: serde_json::Error) -> Self {
        ProtocolError::Payload {
            tag: tag.into(),
            source,
        }
    }
}
