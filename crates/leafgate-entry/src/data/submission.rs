use serde::{Deserialize, Serialize};

use crate::error::MalformedInput;

/// The inbound record, as decoded from JSON.
///
/// Byte fields travel as standard base64. Absent or `null` fields decode
/// as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    #[serde(with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub data:       Vec<u8>,
    #[serde(deserialize_with = "string_or_null", skip_serializing_if = "String::is_empty")]
    pub url:        String,
    #[serde(deserialize_with = "string_or_null", skip_serializing_if = "String::is_empty")]
    pub sha:        String,
    #[serde(with = "base64_bytes")]
    pub signature:  Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
}

impl Submission {
    pub fn from_json(input: &[u8]) -> Result<Self, MalformedInput> {
        serde_json::from_slice(input).map_err(MalformedInput::Decode)
    }
}

fn string_or_null<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: AsRef<[u8]>, S: Serializer>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => STANDARD.decode(text).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
