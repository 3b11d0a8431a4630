//! Wire format for the Driftwire protocol.
//!
//! Messages are JSON objects tagged by a `msg` field. Outbound requests
//! ([`ClientMessage`]) are encoded to wire text; inbound events
//! ([`ServerMessage`]) are decoded once into a tagged variant so higher
//! layers can match on them exhaustively instead of dispatching on a raw
//! string. Unrecognized `msg` values decode to [`ServerMessage::Unknown`]
//! so newer servers never break older clients.
//!
//! Decoding is total: malformed text yields a [`CodecError`], never a
//! panic, because the decode path runs on the transport delivery context.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod messages;

pub use errors::CodecError;
pub use messages::{
    ClientMessage, PROTOCOL_VERSION, RemoteError, SUPPORTED_VERSIONS, ServerMessage,
};
