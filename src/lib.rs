// ── wampwire ────────────────────────────────────────────────────────────────
//
// Message model and codecs for the WAMP pub/sub and RPC protocol: the
// kind registry, typed message variants, the array mapping shared by both
// formats, JSON and MessagePack codecs, and the binary payload convention.
// Sessions, routing and transports live outside this crate.

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;

pub use error::{Result, WireError};
pub use protocol::{Codec, JsonCodec, Message, MessageKind, MsgPackCodec, Serialization};
