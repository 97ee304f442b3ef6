//! Message variants and their wire layouts.
//!
//! Every kind is declared once in the table below. The table drives the
//! struct definition, the declared field order, the set of trailing fields
//! that may be omitted, and a typed decode/encode pair per kind. Frames are
//! arrays of the form `[code, field1, field2, ...]`.

use super::fields::{WireField, decode_field, encode_field};
use super::kind::MessageKind;
use super::value::{Dict, List, WireValue};
use crate::error::{Result, WireError};

/// Reason URIs used by the predefined session-control frames.
pub mod reason {
    pub const UNEXPECTED_MESSAGE_TYPE: &str = "wampwire.error.unexpected_message_type";
    pub const NO_HANDLER_FOR_AUTHMETHOD: &str = "wampwire.error.no_handler_for_authmethod";
    pub const AUTHENTICATION_FAILURE: &str = "wampwire.error.authentication_failure";
    pub const CLOSE_REALM: &str = "wamp.close.close_realm";
    pub const GOODBYE_AND_OUT: &str = "wamp.close.goodbye_and_out";
}

macro_rules! message_table {
    (
        $(
            $(#[$meta:meta])+
            $variant:ident($name:ident) {
                $( $(#[$fmeta:meta])* $field:ident : $fty:ty ),* $(,)?
            }
            $( trailing {
                $( $(#[$ometa:meta])* $ofield:ident : $oty:ty ),* $(,)?
            } )?
        )*
    ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Default)]
            pub struct $name {
                $( $(#[$fmeta])* pub $field: $fty, )*
                $($( $(#[$ometa])* pub $ofield: $oty, )*)?
            }

            impl $name {
                pub const KIND: MessageKind = MessageKind::$variant;

                /// Declared field names in wire order.
                pub const FIELDS: &'static [&'static str] = &[
                    $( stringify!($field), )*
                    $($( stringify!($ofield), )*)?
                ];

                /// Trailing fields dropped from the wire while empty.
                pub const OPTIONAL_FIELDS: &'static [&'static str] = &[
                    $($( stringify!($ofield), )*)?
                ];

                fn from_fields(mut values: std::vec::IntoIter<WireValue>) -> Result<Self> {
                    let mut msg = Self::default();
                    $(
                        if let Some(raw) = values.next() {
                            msg.$field = decode_field(Self::KIND, stringify!($field), raw)?;
                        }
                    )*
                    $($(
                        if let Some(raw) = values.next() {
                            msg.$ofield = decode_field(Self::KIND, stringify!($ofield), raw)?;
                        }
                    )*)?
                    if values.len() > 0 {
                        tracing::trace!(
                            kind = %Self::KIND,
                            extra = values.len(),
                            "ignoring elements past the declared fields"
                        );
                    }
                    Ok(msg)
                }

                fn to_fields(&self, array: &mut Vec<WireValue>) -> Result<()> {
                    $(
                        array.push(encode_field(Self::KIND, stringify!($field), &self.$field)?);
                    )*
                    #[allow(unused_mut)]
                    let mut trailing: Vec<(bool, WireValue)> = Vec::new();
                    $($(
                        trailing.push((
                            WireField::is_empty(&self.$ofield),
                            encode_field(Self::KIND, stringify!($ofield), &self.$ofield)?,
                        ));
                    )*)?
                    // Keep everything up to the last non-empty trailing field.
                    let keep = trailing
                        .iter()
                        .rposition(|(empty, _)| !empty)
                        .map_or(0, |last| last + 1);
                    array.extend(trailing.into_iter().take(keep).map(|(_, value)| value));
                    Ok(())
                }
            }

            impl From<$name> for Message {
                fn from(msg: $name) -> Self {
                    Message::$variant(msg)
                }
            }
        )*

        /// A protocol frame of any kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $( $variant($name), )*
        }

        impl Message {
            pub fn kind(&self) -> MessageKind {
                match self {
                    $( Message::$variant(_) => MessageKind::$variant, )*
                }
            }

            /// Zero-valued instance of `kind`.
            pub fn construct(kind: MessageKind) -> Message {
                match kind {
                    $( MessageKind::$variant => Message::$variant($name::default()), )*
                }
            }

            pub(crate) fn fields_of(kind: MessageKind) -> &'static [&'static str] {
                match kind {
                    $( MessageKind::$variant => $name::FIELDS, )*
                }
            }

            pub(crate) fn optional_fields_of(kind: MessageKind) -> &'static [&'static str] {
                match kind {
                    $( MessageKind::$variant => $name::OPTIONAL_FIELDS, )*
                }
            }

            fn decode_fields(
                kind: MessageKind,
                values: std::vec::IntoIter<WireValue>,
            ) -> Result<Message> {
                match kind {
                    $(
                        MessageKind::$variant => {
                            $name::from_fields(values).map(Message::$variant)
                        }
                    )*
                }
            }

            fn encode_fields(&self, array: &mut Vec<WireValue>) -> Result<()> {
                match self {
                    $( Message::$variant(msg) => msg.to_fields(array), )*
                }
            }
        }
    };
}

message_table! {
    /// `[HELLO, realm, details]`, sent by a client to open a session.
    Hello(Hello) {
        realm: String,
        details: Dict,
    }

    /// `[WELCOME, session id, details]`
    Welcome(Welcome) {
        id: u64,
        details: Dict,
    }

    /// `[ABORT, details, reason]`
    Abort(Abort) {
        details: Dict,
        reason: String,
    }

    /// `[CHALLENGE, auth method, extra]`
    Challenge(Challenge) {
        auth_method: String,
        extra: Dict,
    }

    /// `[AUTHENTICATE, signature, extra]`
    Authenticate(Authenticate) {
        signature: String,
        extra: Dict,
    }

    /// `[GOODBYE, details, reason]`
    Goodbye(Goodbye) {
        details: Dict,
        reason: String,
    }

    /// `[HEARTBEAT, incoming seq, outgoing seq, discard?]`
    Heartbeat(Heartbeat) {
        incoming_seq: u64,
        outgoing_seq: u64,
    } trailing {
        /// Padding the peer should ignore.
        discard: String,
    }

    /// `[ERROR, request type, request id, details, error uri, args?, kwargs?]`
    Error(ErrorMessage) {
        /// Kind of the request this error answers.
        request_type: MessageKind,
        request: u64,
        details: Dict,
        error: String,
    } trailing {
        arguments: List,
        arguments_kw: Dict,
    }

    /// `[PUBLISH, request id, options, topic, args?, kwargs?]`
    Publish(Publish) {
        request: u64,
        options: Dict,
        domain: String,
    } trailing {
        arguments: List,
        arguments_kw: Dict,
    }

    /// `[PUBLISHED, request id, publication id]`
    Published(Published) {
        request: u64,
        publication: u64,
    }

    /// `[SUBSCRIBE, request id, options, topic]`
    Subscribe(Subscribe) {
        request: u64,
        options: Dict,
        domain: String,
    }

    /// `[SUBSCRIBED, request id, subscription id]`
    Subscribed(Subscribed) {
        request: u64,
        subscription: u64,
    }

    /// `[UNSUBSCRIBE, request id, subscription id]`
    Unsubscribe(Unsubscribe) {
        request: u64,
        subscription: u64,
    }

    /// `[UNSUBSCRIBED, request id]`
    Unsubscribed(Unsubscribed) {
        request: u64,
    }

    /// `[EVENT, subscription id, publication id, details, args?, kwargs?]`
    Event(Event) {
        subscription: u64,
        publication: u64,
        details: Dict,
    } trailing {
        arguments: List,
        arguments_kw: Dict,
    }

    /// `[CALL, request id, options, procedure, args?, kwargs?]`
    Call(Call) {
        request: u64,
        options: Dict,
        domain: String,
    } trailing {
        arguments: List,
        arguments_kw: Dict,
    }

    /// `[CANCEL, call request id, options]`
    Cancel(Cancel) {
        request: u64,
        options: Dict,
    }

    /// `[RESULT, call request id, details, args?, kwargs?]`
    Result(ResultMessage) {
        request: u64,
        details: Dict,
    } trailing {
        arguments: List,
        arguments_kw: Dict,
    }

    /// `[REGISTER, request id, options, procedure]`
    Register(Register) {
        request: u64,
        options: Dict,
        domain: String,
    }

    /// `[REGISTERED, request id, registration id]`
    Registered(Registered) {
        request: u64,
        registration: u64,
    }

    /// `[UNREGISTER, request id, registration id]`
    Unregister(Unregister) {
        request: u64,
        registration: u64,
    }

    /// `[UNREGISTERED, request id]`
    Unregistered(Unregistered) {
        request: u64,
    }

    /// `[INVOCATION, request id, registration id, details, args?, kwargs?]`
    Invocation(Invocation) {
        request: u64,
        registration: u64,
        details: Dict,
    } trailing {
        arguments: List,
        arguments_kw: Dict,
    }

    /// `[INTERRUPT, invocation request id, options]`
    Interrupt(Interrupt) {
        request: u64,
        options: Dict,
    }

    /// `[YIELD, invocation request id, options, args?, kwargs?]`
    Yield(Yield) {
        request: u64,
        options: Dict,
    } trailing {
        arguments: List,
        arguments_kw: Dict,
    }
}

impl Message {
    /// Canonical name of this message's kind.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Routing domain (topic or procedure) of the frame.
    pub fn destination(&self) -> Result<&str> {
        match self {
            Message::Publish(msg) => Ok(&msg.domain),
            Message::Subscribe(msg) => Ok(&msg.domain),
            Message::Register(msg) => Ok(&msg.domain),
            Message::Call(msg) => Ok(&msg.domain),
            Message::Hello(_)
            | Message::Welcome(_)
            | Message::Abort(_)
            | Message::Challenge(_)
            | Message::Authenticate(_)
            | Message::Goodbye(_)
            | Message::Heartbeat(_)
            | Message::Error(_)
            | Message::Published(_)
            | Message::Subscribed(_)
            | Message::Unsubscribe(_)
            | Message::Unsubscribed(_)
            | Message::Event(_)
            | Message::Cancel(_)
            | Message::Result(_)
            | Message::Registered(_)
            | Message::Unregister(_)
            | Message::Unregistered(_)
            | Message::Invocation(_)
            | Message::Interrupt(_)
            | Message::Yield(_) => Err(WireError::NoDestination { kind: self.name() }),
        }
    }

    /// Correlation id of a routable request, `None` for every other kind.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Message::Publish(msg) => Some(msg.request),
            Message::Subscribe(msg) => Some(msg.request),
            Message::Register(msg) => Some(msg.request),
            Message::Call(msg) => Some(msg.request),
            Message::Hello(_)
            | Message::Welcome(_)
            | Message::Abort(_)
            | Message::Challenge(_)
            | Message::Authenticate(_)
            | Message::Goodbye(_)
            | Message::Heartbeat(_)
            | Message::Error(_)
            | Message::Published(_)
            | Message::Subscribed(_)
            | Message::Unsubscribe(_)
            | Message::Unsubscribed(_)
            | Message::Event(_)
            | Message::Cancel(_)
            | Message::Result(_)
            | Message::Registered(_)
            | Message::Unregister(_)
            | Message::Unregistered(_)
            | Message::Invocation(_)
            | Message::Interrupt(_)
            | Message::Yield(_) => None,
        }
    }

    /// [`Message::request_id`] with `0` standing in for "no id".
    pub fn request_id_or_zero(&self) -> u64 {
        self.request_id().unwrap_or(0)
    }

    /// Project the message onto its wire array, code first, with empty
    /// trailing fields omitted.
    pub fn to_array(&self) -> Result<Vec<WireValue>> {
        let kind = self.kind();
        let mut array = Vec::with_capacity(1 + kind.fields().len());
        array.push(WireValue::UInt(kind.code()));
        self.encode_fields(&mut array)?;
        Ok(array)
    }

    /// Build a message from a decoded wire array.
    pub fn from_array(array: Vec<WireValue>) -> Result<Message> {
        let mut values = array.into_iter();
        let head = values
            .next()
            .ok_or_else(|| WireError::InvalidMessage("empty frame".into()))?;
        let code = head.as_u64().ok_or_else(|| {
            WireError::UnsupportedWireFormat(format!(
                "leading element must be an integral message code, got {}",
                head.type_name()
            ))
        })?;
        let kind = MessageKind::try_from(code)?;
        Message::decode_fields(kind, values)
    }
}

impl Abort {
    /// Abort sent when a peer receives a kind it did not expect.
    pub fn unexpected_message() -> Self {
        Self::with_reason(reason::UNEXPECTED_MESSAGE_TYPE)
    }

    /// Abort sent when no handler exists for the requested auth method.
    pub fn no_auth_handler() -> Self {
        Self::with_reason(reason::NO_HANDLER_FOR_AUTHMETHOD)
    }

    /// Abort sent when the peer's credentials are rejected.
    pub fn authentication_failure() -> Self {
        Self::with_reason(reason::AUTHENTICATION_FAILURE)
    }

    fn with_reason(reason: &str) -> Self {
        Self {
            details: Dict::new(),
            reason: reason.to_string(),
        }
    }
}

impl Goodbye {
    /// Goodbye sent by the side that closes the realm.
    pub fn close_realm() -> Self {
        Self {
            details: Dict::new(),
            reason: reason::CLOSE_REALM.to_string(),
        }
    }

    /// Reply to a received goodbye.
    pub fn goodbye_and_out() -> Self {
        Self {
            details: Dict::new(),
            reason: reason::GOODBYE_AND_OUT.to_string(),
        }
    }
}
