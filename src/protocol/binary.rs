//! Binary payloads inside textual frames.
//!
//! JSON has no byte-string type, so the protocol reserves strings that start
//! with a NUL character: the remainder is the standard base64 encoding of
//! the bytes. MessagePack carries bytes natively and never needs the marker.

use std::fmt;
use std::ops::Deref;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, WireError};

/// Leading character of a textual binary payload.
pub const BINARY_MARKER: char = '\0';

/// Raw bytes that travel as a NUL-prefixed base64 string in JSON and as a
/// `bin` value in MessagePack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BinaryData(pub Vec<u8>);

impl BinaryData {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// NUL marker followed by the base64 text.
    pub fn to_marked_string(&self) -> String {
        marked_string(&self.0)
    }

    /// Parse a marked string (already unquoted).
    pub fn from_marked_str(text: &str) -> Result<Self> {
        let encoded = text
            .strip_prefix(BINARY_MARKER)
            .ok_or(WireError::NotBinary)?;
        Ok(Self(STANDARD.decode(encoded)?))
    }

    /// Encode as a quoted JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_marked_string())?)
    }

    /// Decode a quoted JSON string produced by [`BinaryData::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let text: String = serde_json::from_str(json)?;
        Self::from_marked_str(&text)
    }
}

pub(crate) fn marked_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(1 + bytes.len().div_ceil(3) * 4);
    out.push(BINARY_MARKER);
    STANDARD.encode_string(bytes, &mut out);
    out
}

/// Serialize bytes with the marker for human-readable formats, natively
/// otherwise.
pub(crate) fn serialize_bytes<S: Serializer>(
    bytes: &[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        serializer.serialize_str(&marked_string(bytes))
    } else {
        serializer.serialize_bytes(bytes)
    }
}

impl Deref for BinaryData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for BinaryData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for BinaryData {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for BinaryData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_bytes(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for BinaryData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct BinaryVisitor;

        impl<'de> Visitor<'de> for BinaryVisitor {
            type Value = BinaryData;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("bytes or a NUL-prefixed base64 string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<BinaryData, E> {
                BinaryData::from_marked_str(v).map_err(E::custom)
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<BinaryData, E> {
                Ok(BinaryData(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(
                self,
                v: Vec<u8>,
            ) -> std::result::Result<BinaryData, E> {
                Ok(BinaryData(v))
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(BinaryVisitor)
        } else {
            deserializer.deserialize_bytes(BinaryVisitor)
        }
    }
}
