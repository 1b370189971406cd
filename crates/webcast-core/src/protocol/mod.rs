//! Push protocol modules (outer envelope, inner response, business events).
//!
//! Layering of an inbound websocket binary message:
//! - `frame`: the `PushFrame` envelope (log id, payload kind, raw payload).
//! - `response`: the gzip-inflated payload of a data frame, carrying the ack
//!   flag, the opaque `internal_ext` blob and the ordered sub-messages.
//! - `events`: the business messages a sub-message payload decodes to.
//!
//! All decoders are panic-free: bad input is reported as
//! `FeedError::Malformed` and never yields a partial result.

pub mod events;
pub mod frame;
pub mod response;
mod wire;

pub use frame::{
    compress_payload, decode_envelope, decompress_payload, encode_ack, encode_heartbeat, Envelope,
    PayloadKind,
};
pub use response::{decode_response, DecodedResponse, SubMessage};
