//! Message kind registry.
//!
//! Wire codes are fixed by the protocol and grouped by role: session
//! control (1-8), publish/subscribe (16-36), calls (48-50) and
//! registration/invocation (64-70).

use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

use super::messages::Message;
use crate::error::{Result, WireError};

/// Discriminator selecting one of the fixed frame shapes.
///
/// The default is the first registry entry; it only matters for the
/// zero-valued `ERROR` frame.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    EnumIter,
    EnumCount,
    FromRepr,
    IntoStaticStr,
)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    #[default]
    Hello = 1,
    Welcome = 2,
    Abort = 3,
    Challenge = 4,
    Authenticate = 5,
    Goodbye = 6,
    Heartbeat = 7,
    Error = 8,

    Publish = 16,
    Published = 17,

    Subscribe = 32,
    Subscribed = 33,
    Unsubscribe = 34,
    Unsubscribed = 35,
    Event = 36,

    Call = 48,
    Cancel = 49,
    Result = 50,

    Register = 64,
    Registered = 65,
    Unregister = 66,
    Unregistered = 67,
    Invocation = 68,
    Interrupt = 69,
    Yield = 70,
}

impl MessageKind {
    /// Every kind, in wire-code order.
    pub const ALL: [MessageKind; MessageKind::COUNT] = [
        MessageKind::Hello,
        MessageKind::Welcome,
        MessageKind::Abort,
        MessageKind::Challenge,
        MessageKind::Authenticate,
        MessageKind::Goodbye,
        MessageKind::Heartbeat,
        MessageKind::Error,
        MessageKind::Publish,
        MessageKind::Published,
        MessageKind::Subscribe,
        MessageKind::Subscribed,
        MessageKind::Unsubscribe,
        MessageKind::Unsubscribed,
        MessageKind::Event,
        MessageKind::Call,
        MessageKind::Cancel,
        MessageKind::Result,
        MessageKind::Register,
        MessageKind::Registered,
        MessageKind::Unregister,
        MessageKind::Unregistered,
        MessageKind::Invocation,
        MessageKind::Interrupt,
        MessageKind::Yield,
    ];

    /// Wire code for this kind.
    pub fn code(self) -> u64 {
        self as u8 as u64
    }

    /// Look up a kind by wire code.
    pub fn from_code(code: u64) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_repr)
    }

    /// Canonical upper-case protocol name, e.g. `"SUBSCRIBED"`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Zero-valued message of this kind.
    pub fn construct(self) -> Message {
        Message::construct(self)
    }

    /// Declared field names in wire order (excluding the code).
    pub fn fields(self) -> &'static [&'static str] {
        Message::fields_of(self)
    }

    /// Trailing fields that are omitted from the wire when empty.
    pub fn optional_fields(self) -> &'static [&'static str] {
        Message::optional_fields_of(self)
    }

    /// Kinds whose frames carry a routing domain.
    pub fn is_routable(self) -> bool {
        matches!(
            self,
            MessageKind::Publish
                | MessageKind::Subscribe
                | MessageKind::Register
                | MessageKind::Call
        )
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u64> for MessageKind {
    type Error = WireError;

    fn try_from(code: u64) -> Result<Self> {
        Self::from_code(code).ok_or(WireError::UnsupportedMessageType(code))
    }
}

/// Zero-valued instance for a wire code.
pub fn construct(code: u64) -> Result<Message> {
    MessageKind::try_from(code).map(MessageKind::construct)
}

/// Name for a code that is known to be in the registry.
///
/// # Panics
///
/// Panics when `code` is not a registered kind. The registry is closed, so
/// reaching this with an unknown code is a logic error in the caller.
pub fn name(code: u64) -> &'static str {
    match MessageKind::from_code(code) {
        Some(kind) => kind.name(),
        None => panic!("invalid message type {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_codes_match_protocol_table() {
        assert_eq!(MessageKind::Hello.code(), 1);
        assert_eq!(MessageKind::Error.code(), 8);
        assert_eq!(MessageKind::Publish.code(), 16);
        assert_eq!(MessageKind::Event.code(), 36);
        assert_eq!(MessageKind::Call.code(), 48);
        assert_eq!(MessageKind::Result.code(), 50);
        assert_eq!(MessageKind::Register.code(), 64);
        assert_eq!(MessageKind::Yield.code(), 70);
    }

    #[test]
    fn test_all_matches_iteration_order() {
        let iterated: Vec<_> = MessageKind::iter().collect();
        assert_eq!(iterated, MessageKind::ALL.to_vec());
        assert!(MessageKind::ALL.windows(2).all(|w| w[0].code() < w[1].code()));
    }

    #[test]
    fn test_code_roundtrip() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_codes() {
        for code in [0, 9, 15, 18, 37, 51, 71, 99, 256, 257, u64::MAX] {
            assert_eq!(MessageKind::from_code(code), None, "code {code}");
            assert!(matches!(
                construct(code),
                Err(WireError::UnsupportedMessageType(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(MessageKind::Unsubscribed.name(), "UNSUBSCRIBED");
        assert_eq!(MessageKind::Error.to_string(), "ERROR");
        assert_eq!(name(33), "SUBSCRIBED");
        assert_eq!(name(70), "YIELD");
    }

    #[test]
    #[should_panic(expected = "invalid message type")]
    fn test_name_of_unknown_code_panics() {
        name(9);
    }

    #[test]
    fn test_construct_yields_matching_kind() {
        for kind in MessageKind::ALL {
            let msg = construct(kind.code()).expect("registered code");
            assert_eq!(msg.kind(), kind);
        }
    }

    #[test]
    fn test_routable_kinds() {
        let routable: Vec<_> = MessageKind::ALL
            .into_iter()
            .filter(|k| k.is_routable())
            .collect();
        assert_eq!(
            routable,
            vec![
                MessageKind::Publish,
                MessageKind::Subscribe,
                MessageKind::Call,
                MessageKind::Register
            ]
        );
    }
}
