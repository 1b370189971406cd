//! Keep-alive task that lives only while a connection is open.
//!
//! The task never touches the socket. It asks the session task (the single
//! socket owner) to send a heartbeat through an `mpsc` channel. A failed
//! request ends the loop quietly; closing or retrying is the session's job.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::transport::codec::heartbeat_message;

pub struct HeartbeatScheduler;

impl HeartbeatScheduler {
    /// Spawn the heartbeat loop. The first heartbeat goes out immediately;
    /// consecutive ones are at least `interval` apart.
    pub fn start(interval: Duration, outbound: mpsc::Sender<Message>) -> HeartbeatHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sent: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    res = outbound.send(heartbeat_message()) => {
                        if res.is_err() {
                            tracing::debug!("heartbeat channel closed; heartbeat loop ends");
                            break;
                        }
                        sent += 1;
                        tracing::trace!(sent, "heartbeat queued");
                    }
                }
            }
            tracing::debug!(sent, "heartbeat stopped");
        });

        HeartbeatHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owner of a running heartbeat task. Dropping it cancels the task.
pub struct HeartbeatHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    /// Cancel and wait for the task; no heartbeat is queued after this returns.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "heartbeat task join failed");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use tokio::time::Instant;

    use super::*;

    const H: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn heartbeats_are_spaced_by_interval() {
        let (tx, mut rx) = mpsc::channel(8);
        let hb = HeartbeatScheduler::start(H, tx);

        let mut seen = Vec::new();
        for _ in 0..4 {
            let msg = rx.recv().await.unwrap();
            assert!(matches!(msg, Message::Ping(_)));
            seen.push(Instant::now());
        }
        for pair in seen.windows(2) {
            assert!(pair[1] - pair[0] >= H);
        }
        hb.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_one_heartbeat_after_stop() {
        let (tx, mut rx) = mpsc::channel(8);
        let hb = HeartbeatScheduler::start(H, tx);
        rx.recv().await.unwrap();

        hb.stop().await;
        tokio::time::advance(H * 10).await;

        let mut after = 0;
        while rx.try_recv().is_ok() {
            after += 1;
        }
        assert!(after <= 1, "{after} heartbeats after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn closed_channel_ends_loop_without_stop() {
        let (tx, rx) = mpsc::channel(8);
        let hb = HeartbeatScheduler::start(H, tx);
        drop(rx);

        tokio::time::sleep(H * 2).await;
        assert!(hb.is_finished());
    }
}
