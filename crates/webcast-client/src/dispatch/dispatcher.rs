use std::sync::Arc;

use bytes::Bytes;

use webcast_core::error::Result;
use webcast_core::protocol::{
    decode_response, decompress_payload, encode_ack, Envelope, PayloadKind, SubMessage,
};

use crate::handlers::HandlerContext;
use crate::state::SharedState;

use super::HandlerRegistry;

/// Per-frame dispatch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub handled: usize,
    /// No enabled handler for the type key.
    pub skipped: usize,
    pub failed: usize,
    /// A control message announced the end of the broadcast.
    pub end_of_broadcast: bool,
}

/// Result of processing one inbound envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Encoded ack to send back, present iff the response asked for one.
    pub ack: Option<Bytes>,
    pub report: DispatchReport,
}

/// Runs decoded frames through the handler registry.
pub struct Dispatcher {
    registry: HandlerRegistry,
    shared: Arc<SharedState>,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, shared: Arc<SharedState>) -> Self {
        Self { registry, shared }
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Dispatch sub-messages sequentially in delivery order.
    ///
    /// A handler failure is logged and does not stop the remaining messages.
    pub fn dispatch(&self, messages: &[SubMessage]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for msg in messages {
            let Some(handler) = self.registry.resolve(&msg.method) else {
                report.skipped += 1;
                tracing::trace!(method = %msg.method, "no handler; skipped");
                continue;
            };

            let ctx = HandlerContext {
                method: &msg.method,
                options: &handler.options,
                shared: &self.shared,
            };
            match (handler.run)(&msg.payload, &ctx) {
                Ok(event) => {
                    report.handled += 1;
                    if event.ends_broadcast() {
                        report.end_of_broadcast = true;
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        method = %msg.method,
                        size = msg.payload.len(),
                        code = e.kind().as_str(),
                        error = %e,
                        "handler failed"
                    );
                }
            }
        }

        report
    }

    /// Decode one envelope, dispatch its messages, and build the ack.
    ///
    /// Heartbeat and ack envelopes from the server carry nothing to dispatch.
    pub fn process_frame(&self, env: &Envelope) -> Result<FrameOutcome> {
        if env.kind != PayloadKind::Data {
            return Ok(FrameOutcome::default());
        }

        let raw = decompress_payload(env)?;
        let response = decode_response(&raw)?;
        let report = self.dispatch(&response.messages);

        let ack = response
            .need_ack
            .then(|| encode_ack(env.log_id, &response.internal_ext));

        Ok(FrameOutcome { ack, report })
    }
}
