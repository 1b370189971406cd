//! Client websocket connector.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE, USER_AGENT};
use tokio_tungstenite::tungstenite::Message;

use webcast_core::error::{FeedError, Result};

use crate::bootstrap::ConnectTarget;

pub type FrameSink = Pin<Box<dyn Sink<Message, Error = FeedError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// Split socket. The session task owns both halves.
pub struct Socket {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens a socket for a signed target.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &ConnectTarget) -> Result<Socket>;
}

/// `tokio-tungstenite` connector with a bounded handshake.
pub struct WsConnector {
    handshake_timeout: Duration,
}

impl WsConnector {
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

fn header(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| FeedError::Network(format!("bad header value: {e}")))
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, target: &ConnectTarget) -> Result<Socket> {
        let mut request = target
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| FeedError::Network(format!("build ws request: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(COOKIE, header(&format!("ttwid={}", target.cookie))?);
        headers.insert(USER_AGENT, header(&target.user_agent)?);

        let (ws, resp) = match tokio::time::timeout(self.handshake_timeout, connect_async(request))
            .await
        {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => return Err(FeedError::Network(format!("ws handshake: {e}"))),
            Err(_) => {
                return Err(FeedError::Network(format!(
                    "ws handshake timed out after {:?}",
                    self.handshake_timeout
                )))
            }
        };
        tracing::debug!(status = %resp.status(), room_id = %target.room_id, "ws handshake complete");

        let (sink, stream) = ws.split();
        let sink = sink.sink_map_err(|e| FeedError::Network(format!("ws send: {e}")));
        let stream = stream.map(|r| r.map_err(|e| FeedError::Network(format!("ws recv: {e}"))));

        Ok(Socket {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
