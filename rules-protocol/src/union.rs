//! Codec for the platform's tagged "union object" shape.
//!
//! Every tagged node on the wire looks like `{"<tag>": <payload>, "type": "<tag>"}`.
//! Decoding prefers the `type` field; when it is absent the first known tag
//! present as a key wins, which is how hand-written documents are usually
//! accepted by the platform.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ProtocolError;

/// Name of the discriminator field.
pub const TAG_FIELD: &str = "type";

/// Serializes `payload` as `{tag: payload, "type": tag}`.
pub fn serialize_union<S, T>(serializer: S, tag: &str, payload: &T) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry(tag, payload)?;
    map.serialize_entry(TAG_FIELD, tag)?;
    map.end()
}

/// Returns the discriminator and payload of a union object restricted to `known` tags.
pub fn split_union<'a>(
    value: &'a Value,
    context: &'static str,
    known: &[&'static str],
) -> Result<(&'static str, &'a Value), ProtocolError> {
    let object = value
        .as_object()
        .ok_or(ProtocolError::NotAnObject { context })?;

    if let Some(tag) = object.get(TAG_FIELD).and_then(Value::as_str) {
        let known_tag = known
            .iter()
            .copied()
            .find(|candidate| *candidate == tag)
            .ok_or_else(|| ProtocolError::UnknownTag {
                context,
                tag: tag.to_string(),
                expected: known.join(", "),
            })?;
        let payload = object
            .get(known_tag)
            .ok_or_else(|| ProtocolError::MissingField {
                tag: known_tag.to_string(),
                field: known_tag,
            })?;
        return Ok((known_tag, payload));
    }

    known
        .iter()
        .copied()
        .find_map(|tag| object.get(tag).map(|payload| (tag, payload)))
        .ok_or_else(|| ProtocolError::Untagged {
            context,
            expected: known.join(", "),
        })
}
