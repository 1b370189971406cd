//! Outer `PushFrame` envelope (panic-free).
//!
//! Parsing rules:
//! - The payload kind tag must be one of `msg`, `hb`, `ack`.
//! - Inflating a data payload fails closed: corrupt or oversized gzip input is
//!   an error, never a truncated buffer.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use prost::Message as _;

use crate::error::{FeedError, Result};
use crate::protocol::wire::{HeaderEntry, PushFrame};

/// Upper bound on an inflated data payload.
pub const MAX_INFLATED_BYTES: u64 = 16 * 1024 * 1024;

/// Payload kind carried in the envelope's `payload_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Gzip-compressed `Response` (`msg`).
    Data,
    /// Keep-alive (`hb`).
    Heartbeat,
    /// Acknowledgment (`ack`).
    Ack,
}

impl PayloadKind {
    /// Wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKind::Data => "msg",
            PayloadKind::Heartbeat => "hb",
            PayloadKind::Ack => "ack",
        }
    }

    fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "msg" => Ok(PayloadKind::Data),
            "hb" => Ok(PayloadKind::Heartbeat),
            "ack" => Ok(PayloadKind::Ack),
            other => Err(FeedError::Malformed(format!(
                "unknown payload type: {other:?}"
            ))),
        }
    }
}

/// Decoded outer frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sequence id assigned by the push server.
    pub seq_id: u64,
    /// Log id; echoed back in the ack for this frame.
    pub log_id: u64,
    /// Payload kind.
    pub kind: PayloadKind,
    /// Frame headers in wire order (e.g. `compress_type`).
    pub headers: Vec<(String, String)>,
    /// Raw payload (compressed for data frames).
    pub payload: Bytes,
}

impl Envelope {
    /// Envelope with no headers and no sequence id.
    pub fn new(log_id: u64, kind: PayloadKind, payload: impl Into<Bytes>) -> Self {
        Self {
            seq_id: 0,
            log_id,
            kind,
            headers: Vec::new(),
            payload: payload.into(),
        }
    }

    /// Look up a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Bytes {
        let frame = PushFrame {
            seq_id: self.seq_id,
            log_id: self.log_id,
            headers: self
                .headers
                .iter()
                .map(|(key, value)| HeaderEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
            payload_type: self.kind.as_str().to_string(),
            payload: self.payload.to_vec(),
            ..Default::default()
        };
        Bytes::from(frame.encode_to_vec())
    }
}

/// Decode an envelope from a websocket binary message.
pub fn decode_envelope(buf: &[u8]) -> Result<Envelope> {
    if buf.is_empty() {
        return Err(FeedError::Malformed("empty frame".into()));
    }

    let frame = PushFrame::decode(buf)
        .map_err(|e| FeedError::Malformed(format!("invalid push frame: {e}")))?;
    let kind = PayloadKind::from_tag(&frame.payload_type)?;

    Ok(Envelope {
        seq_id: frame.seq_id,
        log_id: frame.log_id,
        kind,
        headers: frame
            .headers
            .into_iter()
            .map(|h| (h.key, h.value))
            .collect(),
        payload: Bytes::from(frame.payload),
    })
}

/// Initial inflate buffer for a compressed payload of `compressed_len` bytes,
/// never more than the inflate bound.
fn inflate_capacity(compressed_len: usize) -> usize {
    compressed_len
        .saturating_mul(4)
        .min(MAX_INFLATED_BYTES as usize)
}

/// Inflate the gzip payload of a data frame.
pub fn decompress_payload(env: &Envelope) -> Result<Bytes> {
    if env.kind != PayloadKind::Data {
        return Err(FeedError::Malformed(format!(
            "cannot inflate a {} frame",
            env.kind.as_str()
        )));
    }
    if let Some(ct) = env.header("compress_type") {
        if ct != "gzip" {
            return Err(FeedError::Malformed(format!("unsupported compression: {ct}")));
        }
    }

    let mut out = Vec::with_capacity(inflate_capacity(env.payload.len()));
    GzDecoder::new(env.payload.as_ref())
        .take(MAX_INFLATED_BYTES + 1)
        .read_to_end(&mut out)
        .map_err(|e| FeedError::Malformed(format!("gzip inflate failed: {e}")))?;

    if out.len() as u64 > MAX_INFLATED_BYTES {
        return Err(FeedError::Malformed("inflated payload too large".into()));
    }
    Ok(Bytes::from(out))
}

/// Gzip `raw` the way the push server compresses data payloads.
pub fn compress_payload(raw: &[u8]) -> Result<Bytes> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(raw)
        .map_err(|e| FeedError::Malformed(format!("gzip deflate failed: {e}")))?;
    let out = enc
        .finish()
        .map_err(|e| FeedError::Malformed(format!("gzip deflate failed: {e}")))?;
    Ok(Bytes::from(out))
}

/// Ack for the frame `log_id`, carrying the response's `internal_ext` verbatim.
pub fn encode_ack(log_id: u64, internal_ext: &str) -> Bytes {
    Envelope::new(log_id, PayloadKind::Ack, internal_ext.as_bytes().to_vec()).encode()
}

/// Keep-alive frame.
pub fn encode_heartbeat() -> Bytes {
    Envelope::new(0, PayloadKind::Heartbeat, Bytes::new()).encode()
}
