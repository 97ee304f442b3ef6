//! Error taxonomy for the message layer.
//!
//! Every decode-path failure surfaces as a [`WireError`]. Format-level
//! failures from `serde_json`, `rmp-serde` and `base64` are wrapped so callers
//! match on one type regardless of the codec in use.

/// Result alias used throughout the protocol modules.
pub type Result<T> = std::result::Result<T, WireError>;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The leading code is integral but not part of the registry.
    #[error("unsupported message type: {0}")]
    UnsupportedMessageType(u64),

    /// The outer frame is empty or not an array.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A field could not be mapped onto its declared type.
    #[error("message format error in {kind} field {field}: {reason}")]
    MessageFormat {
        kind: &'static str,
        field: String,
        reason: String,
    },

    /// The leading element is not an integral message code.
    #[error("unsupported message format: {0}")]
    UnsupportedWireFormat(String),

    /// `destination` was asked for a kind that carries no routing domain.
    #[error("cannot determine destination from: {kind}")]
    NoDestination { kind: &'static str },

    /// A binary payload string without the leading NUL marker.
    #[error("not a binary string, doesn't start with a NUL")]
    NotBinary,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

impl WireError {
    /// True for errors caused by the shape of an otherwise parseable frame.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            WireError::MessageFormat { .. }
                | WireError::UnsupportedWireFormat(_)
                | WireError::InvalidMessage(_)
        )
    }
}
