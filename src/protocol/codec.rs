//! Byte-level codecs for frames.
//!
//! Both codecs share the array projection in [`Message::to_array`] and the
//! field mapping in [`Message::from_array`]; they differ only in how the
//! array is written out. A frame produced by one decodes to the same
//! message through the other.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::messages::Message;
use super::value::WireValue;
use crate::error::{Result, WireError};

/// Wire serialization format.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Serialization {
    /// JSON arrays, binary payloads as NUL-prefixed base64 strings.
    #[default]
    Json,
    /// MessagePack arrays with native binary.
    #[serde(alias = "messagepack")]
    #[strum(to_string = "msgpack", serialize = "messagepack")]
    #[value(name = "msgpack", alias = "messagepack")]
    MsgPack,
}

impl Serialization {
    /// Codec implementing this format.
    pub fn codec(self) -> Box<dyn Codec> {
        match self {
            Serialization::Json => Box::new(JsonCodec),
            Serialization::MsgPack => Box::new(MsgPackCodec),
        }
    }

    /// WebSocket subprotocol negotiated for this format.
    pub fn websocket_subprotocol(self) -> &'static str {
        match self {
            Serialization::Json => "wamp.2.json",
            Serialization::MsgPack => "wamp.2.msgpack",
        }
    }

    /// Whether frames in this format must travel as binary transport
    /// messages.
    pub fn is_binary(self) -> bool {
        matches!(self, Serialization::MsgPack)
    }
}

/// Converts messages to and from transport frames.
pub trait Codec: Send + Sync {
    fn encode(&self, message: &Message) -> Result<Vec<u8>>;

    fn decode(&self, frame: &[u8]) -> Result<Message>;

    fn serialization(&self) -> Serialization;
}

/// Textual codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

/// Compact binary codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl Codec for JsonCodec {
    fn encode(&self, message: &Message) -> Result<Vec<u8>> {
        let array = message.to_array()?;
        let bytes = serde_json::to_vec(&array)?;
        trace!(kind = %message.kind(), len = bytes.len(), "encoded JSON frame");
        Ok(bytes)
    }

    fn decode(&self, frame: &[u8]) -> Result<Message> {
        let doc: serde_json::Value = serde_json::from_slice(frame).inspect_err(|e| {
            debug!(error = %e, len = frame.len(), "rejected unparseable JSON frame");
        })?;
        decode_raw(WireValue::from_json(doc), Serialization::Json)
    }

    fn serialization(&self) -> Serialization {
        Serialization::Json
    }
}

impl Codec for MsgPackCodec {
    fn encode(&self, message: &Message) -> Result<Vec<u8>> {
        let array = message.to_array()?;
        let bytes = rmp_serde::to_vec(&array)?;
        trace!(kind = %message.kind(), len = bytes.len(), "encoded MessagePack frame");
        Ok(bytes)
    }

    fn decode(&self, frame: &[u8]) -> Result<Message> {
        let raw: WireValue = rmp_serde::from_slice(frame).inspect_err(|e| {
            debug!(error = %e, len = frame.len(), "rejected unparseable MessagePack frame");
        })?;
        decode_raw(raw, Serialization::MsgPack)
    }

    fn serialization(&self) -> Serialization {
        Serialization::MsgPack
    }
}

fn decode_raw(raw: WireValue, format: Serialization) -> Result<Message> {
    let array = match raw {
        WireValue::List(items) => items,
        other => {
            debug!(%format, got = other.type_name(), "rejected non-array frame");
            return Err(WireError::InvalidMessage(format!(
                "expected an array, got {}",
                other.type_name()
            )));
        }
    };
    let message = Message::from_array(array).inspect_err(|e| {
        debug!(%format, error = %e, "rejected frame");
    })?;
    trace!(%format, kind = %message.kind(), "decoded frame");
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{Call, Subscribed};
    use crate::protocol::value::Value;

    #[test]
    fn test_subscribed_json_bytes() {
        let msg = Message::from(Subscribed {
            request: 7,
            subscription: 42,
        });
        assert_eq!(JsonCodec.encode(&msg).unwrap(), b"[33,7,42]");
    }

    #[test]
    fn test_subscribed_msgpack_bytes() {
        let msg = Message::from(Subscribed {
            request: 7,
            subscription: 42,
        });
        // fixarray(3), then three positive fixints
        assert_eq!(MsgPackCodec.encode(&msg).unwrap(), vec![0x93, 33, 7, 42]);
    }

    #[test]
    fn test_json_float_code_is_accepted() {
        let msg = JsonCodec.decode(b"[33.0, 7, 42]").unwrap();
        assert_eq!(
            msg,
            Message::from(Subscribed {
                request: 7,
                subscription: 42
            })
        );
    }

    #[test]
    fn test_non_array_frames() {
        assert!(matches!(
            JsonCodec.decode(b"{\"a\":1}"),
            Err(WireError::InvalidMessage(_))
        ));
        assert!(matches!(JsonCodec.decode(b"[]"), Err(WireError::InvalidMessage(_))));
        assert!(matches!(JsonCodec.decode(b"[\"x\"]"), Err(WireError::UnsupportedWireFormat(_))));
        assert!(matches!(JsonCodec.decode(b"[9]"), Err(WireError::UnsupportedMessageType(9))));
        assert!(matches!(JsonCodec.decode(b"not json"), Err(WireError::Json(_))));
        assert!(matches!(MsgPackCodec.decode(&[0xc1]), Err(WireError::MsgPackDecode(_))));
        assert!(matches!(MsgPackCodec.decode(&[0x90]), Err(WireError::InvalidMessage(_))));
    }

    #[test]
    fn test_binary_payload_per_format() {
        let msg = Message::from(Call {
            request: 1,
            domain: "blob.put".into(),
            arguments: vec![Value::Binary(vec![0xff, 0x00].into())],
            ..Default::default()
        });
        let json = JsonCodec.encode(&msg).unwrap();
        assert_eq!(json, b"[48,1,{},\"blob.put\",[\"\\u0000/wA=\"]]");
        assert_eq!(JsonCodec.decode(&json).unwrap(), msg);

        let packed = MsgPackCodec.encode(&msg).unwrap();
        assert_eq!(MsgPackCodec.decode(&packed).unwrap(), msg);
    }

    #[test]
    fn test_serialization_selection() {
        assert_eq!(Serialization::default(), Serialization::Json);
        assert_eq!(Serialization::MsgPack.codec().serialization(), Serialization::MsgPack);
        assert_eq!(Serialization::Json.websocket_subprotocol(), "wamp.2.json");
        assert!(Serialization::MsgPack.is_binary());
        assert_eq!("MsgPack".parse::<Serialization>().unwrap(), Serialization::MsgPack);
        assert_eq!(Serialization::Json.to_string(), "json");
    }
}
