//! WAMP message model and wire codecs.
//!
//! ## Frame layout
//!
//! Every frame is an array whose first element is the integral kind code and
//! whose remaining elements are the kind's fields in declared order. Trailing
//! argument fields are omitted while empty, so a `CALL` without arguments
//! is shorter than one with them.
//!
//! ## Formats
//!
//! [`JsonCodec`] writes the array as JSON and carries raw bytes as
//! NUL-prefixed base64 strings. [`MsgPackCodec`] writes the same array as
//! MessagePack. Ids are limited to 2^53 in both so either format can be
//! relayed through the other.

pub mod binary;
pub mod codec;
mod fields;
pub mod kind;
pub mod messages;
pub mod value;

pub use binary::{BINARY_MARKER, BinaryData};
pub use codec::{Codec, JsonCodec, MsgPackCodec, Serialization};
pub use kind::MessageKind;
pub use messages::{
    Abort, Authenticate, Call, Cancel, Challenge, ErrorMessage, Event, Goodbye, Heartbeat, Hello,
    Interrupt, Invocation, Message, Publish, Published, Register, Registered, ResultMessage,
    Subscribe, Subscribed, Unregister, Unregistered, Unsubscribe, Unsubscribed, Welcome, Yield,
};
pub use value::{Dict, List, MAX_SAFE_INTEGER, Value, WireValue};
