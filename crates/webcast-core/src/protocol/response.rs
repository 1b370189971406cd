//! Inner response carried (gzip-compressed) by data frames.

use bytes::Bytes;
use prost::Message as _;

use crate::error::{FeedError, Result};
use crate::protocol::wire;

/// One typed business event inside a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMessage {
    /// Dispatch key, e.g. `WebcastChatMessage`.
    pub method: String,
    /// Opaque protobuf payload of the event.
    pub payload: Bytes,
}

impl SubMessage {
    pub fn new(method: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            method: method.into(),
            payload: payload.into(),
        }
    }
}

/// Decoded inner payload. `messages` is in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedResponse {
    pub need_ack: bool,
    /// Opaque extension blob; echoed verbatim in the ack.
    pub internal_ext: String,
    pub messages: Vec<SubMessage>,
}

impl DecodedResponse {
    /// Serialize to the (uncompressed) wire shape.
    pub fn encode(&self) -> Vec<u8> {
        wire::Response {
            messages: self
                .messages
                .iter()
                .map(|m| wire::Message {
                    method: m.method.clone(),
                    payload: m.payload.to_vec(),
                    ..Default::default()
                })
                .collect(),
            internal_ext: self.internal_ext.clone(),
            need_ack: self.need_ack,
            ..Default::default()
        }
        .encode_to_vec()
    }
}

/// Decode an inflated data payload.
pub fn decode_response(buf: &[u8]) -> Result<DecodedResponse> {
    let resp = wire::Response::decode(buf)
        .map_err(|e| FeedError::Malformed(format!("invalid response: {e}")))?;

    Ok(DecodedResponse {
        need_ack: resp.need_ack,
        internal_ext: resp.internal_ext,
        messages: resp
            .messages
            .into_iter()
            .map(|m| SubMessage {
                method: m.method,
                payload: Bytes::from(m.payload),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn keeps_sub_message_order() {
        let resp = DecodedResponse {
            need_ack: true,
            internal_ext: "seq:1".into(),
            messages: vec![
                SubMessage::new("WebcastChatMessage", vec![1u8]),
                SubMessage::new("WebcastGiftMessage", vec![2u8]),
                SubMessage::new("WebcastChatMessage", vec![3u8]),
            ],
        };
        let back = decode_response(&resp.encode()).unwrap();
        let methods: Vec<_> = back.messages.iter().map(|m| m.method.as_str()).collect();
        assert_eq!(
            methods,
            ["WebcastChatMessage", "WebcastGiftMessage", "WebcastChatMessage"]
        );
        assert_eq!(back.messages[2].payload.as_ref(), &[3u8]);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = decode_response(&[0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(err.kind().as_str(), "MALFORMED");
    }
}
