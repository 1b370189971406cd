//! Decode-once codec for push-server messages.
//!
//! - Binary messages => `Envelope`
//! - Ping/Pong/Close are surfaced for lifecycle management
//! - Text and raw frames carry nothing for this client

use bytes::Bytes;
use tokio_tungstenite::tungstenite::Message;
use webcast_core::error::Result;
use webcast_core::protocol::{decode_envelope, encode_heartbeat, Envelope};

#[derive(Debug)]
pub enum Inbound {
    Frame(Envelope),
    Ping,
    Pong,
    Close,
    Ignored,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Binary(b) => Ok(Inbound::Frame(decode_envelope(&b)?)),
        Message::Ping(_) => Ok(Inbound::Ping),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
        Message::Text(_) | Message::Frame(_) => Ok(Inbound::Ignored),
    }
}

/// Ack envelopes travel as binary messages.
pub fn ack_message(ack: Bytes) -> Message {
    Message::Binary(ack)
}

/// The push server expects the heartbeat envelope inside a ping.
pub fn heartbeat_message() -> Message {
    Message::Ping(encode_heartbeat())
}
