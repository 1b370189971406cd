use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatcher;
use crate::heartbeat::{HeartbeatHandle, HeartbeatScheduler};
use crate::transport::codec::{ack_message, decode};
use crate::transport::{FrameSink, FrameStream, Inbound, Socket};

const OUTBOUND_CAPACITY: usize = 64;

/// Upper bound on the close handshake; a peer that stopped reading must not
/// hold the teardown.
pub(super) const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Why an open session ended.
#[derive(Debug)]
pub(super) enum SessionEnd {
    External,
    BroadcastEnded,
    Lost(String),
}

/// One open socket plus its heartbeat task.
pub(super) struct Session {
    sink: FrameSink,
    stream: FrameStream,
    outbound: mpsc::Receiver<Message>,
    heartbeat: HeartbeatHandle,
}

impl Session {
    pub(super) fn start(socket: Socket, heartbeat_interval: Duration) -> Self {
        let (out_tx, outbound) = mpsc::channel::<Message>(OUTBOUND_CAPACITY);
        Self {
            sink: socket.sink,
            stream: socket.stream,
            outbound,
            heartbeat: HeartbeatScheduler::start(heartbeat_interval, out_tx),
        }
    }

    /// Write `msg`, giving up as soon as a stop is requested.
    async fn send(&mut self, msg: Message, stop: &CancellationToken) -> Option<SessionEnd> {
        tokio::select! {
            biased;
            _ = stop.cancelled() => Some(SessionEnd::External),
            res = self.sink.send(msg) => res.err().map(|e| SessionEnd::Lost(e.to_string())),
        }
    }

    /// Receive loop. Returns once the socket must close; call `close` next.
    pub(super) async fn run(&mut self, dispatcher: &Dispatcher, stop: &CancellationToken) -> SessionEnd {
        let mut frames: u64 = 0;

        let end = loop {
            tokio::select! {
                biased;

                _ = stop.cancelled() => break SessionEnd::External,

                // heartbeat requests
                Some(msg) = self.outbound.recv() => {
                    if let Some(end) = self.send(msg, stop).await {
                        break end;
                    }
                }

                incoming = self.stream.next() => {
                    let msg = match incoming {
                        Some(Ok(m)) => m,
                        Some(Err(e)) => break SessionEnd::Lost(e.to_string()),
                        None => break SessionEnd::Lost("stream ended".into()),
                    };

                    let env = match decode(msg) {
                        Ok(Inbound::Frame(env)) => env,
                        Ok(Inbound::Close) => break SessionEnd::Lost("closed by peer".into()),
                        Ok(_) => continue,
                        Err(e) => {
                            tracing::warn!(code = e.kind().as_str(), error = %e, "dropping undecodable message");
                            continue;
                        }
                    };

                    frames += 1;
                    let outcome = match dispatcher.process_frame(&env) {
                        Ok(o) => o,
                        Err(e) => {
                            tracing::warn!(
                                log_id = env.log_id,
                                code = e.kind().as_str(),
                                error = %e,
                                "dropping frame"
                            );
                            continue;
                        }
                    };

                    if let Some(ack) = outcome.ack {
                        if let Some(end) = self.send(ack_message(ack), stop).await {
                            break end;
                        }
                        tracing::trace!(log_id = env.log_id, "ack sent");
                    }
                    if outcome.report.end_of_broadcast {
                        break SessionEnd::BroadcastEnded;
                    }
                }
            }
        };

        tracing::debug!(frames, end = ?end, "session finished");
        end
    }

    /// Join the heartbeat, then close the socket within `CLOSE_TIMEOUT`.
    /// The socket is dropped either way.
    pub(super) async fn close(self, end: &SessionEnd) {
        let Session {
            mut sink,
            heartbeat,
            ..
        } = self;

        heartbeat.stop().await;

        let closing = async {
            if !matches!(end, SessionEnd::Lost(_)) {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "close frame not sent");
                }
            }
            if let Err(e) = sink.close().await {
                tracing::debug!(error = %e, "socket close failed");
            }
        };
        if tokio::time::timeout(CLOSE_TIMEOUT, closing).await.is_err() {
            tracing::debug!(timeout = ?CLOSE_TIMEOUT, "close handshake timed out; dropping socket");
        }
    }
}
