use std::sync::Arc;

use tokio::sync::watch;

use webcast_core::error::Result;

use crate::bootstrap::Bootstrap;
use crate::config::ConnectionSection;
use crate::dispatch::Dispatcher;
use crate::transport::{Connector, Socket};

use super::session::{Session, SessionEnd};
use super::{ConnState, RunOutcome, StopHandle, StopReason};

/// Owns the connect / receive / retry cycle for one room.
///
/// Only failures before a connection reaches `Open` count against
/// `max_retries`; the counter resets once a socket opens. A room-status
/// probe runs after every open session and once more when the budget is
/// spent.
pub struct ConnectionManager {
    cfg: ConnectionSection,
    bootstrap: Arc<dyn Bootstrap>,
    connector: Arc<dyn Connector>,
    dispatcher: Dispatcher,
    stop: StopHandle,
    state: watch::Sender<ConnState>,
}

impl ConnectionManager {
    pub fn new(
        cfg: ConnectionSection,
        bootstrap: Arc<dyn Bootstrap>,
        connector: Arc<dyn Connector>,
        dispatcher: Dispatcher,
    ) -> Self {
        let (state, _) = watch::channel(ConnState::Init);
        Self {
            cfg,
            bootstrap,
            connector,
            dispatcher,
            stop: StopHandle::default(),
            state,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ConnState {
        *self.state.borrow()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn set_state(&self, next: ConnState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::debug!(from = prev.as_str(), to = next.as_str(), "connection state");
        }
    }

    /// Run until stopped, the broadcast ends, or the retry budget is spent.
    pub async fn run(&self) -> RunOutcome {
        let stop = self.stop.token();
        let max = self.cfg.max_retries.max(1);
        let mut attempts: u32 = 0;

        loop {
            if stop.is_cancelled() {
                return self.finish(StopReason::External);
            }
            attempts += 1;

            let opened = tokio::select! {
                biased;
                _ = stop.cancelled() => return self.finish(StopReason::External),
                r = self.open() => r,
            };

            match opened {
                Err(e) => {
                    tracing::warn!(
                        attempt = attempts,
                        max_retries = max,
                        code = e.kind().as_str(),
                        error = %e,
                        "connection attempt failed"
                    );
                    if attempts >= max {
                        self.set_state(ConnState::Failed);
                        self.probe().await;
                        tracing::error!(attempts, "retry budget exhausted");
                        return RunOutcome::Exhausted { attempts };
                    }
                }
                Ok(socket) => {
                    attempts = 0;
                    self.set_state(ConnState::Open);
                    tracing::info!("connected to push server");

                    let mut session = Session::start(socket, self.cfg.heartbeat_interval());
                    let end = session.run(&self.dispatcher, stop).await;

                    self.set_state(ConnState::Closing);
                    session.close(&end).await;
                    self.probe().await;

                    match end {
                        SessionEnd::External => return self.finish(StopReason::External),
                        SessionEnd::BroadcastEnded => {
                            tracing::info!("broadcast ended");
                            return self.finish(StopReason::BroadcastEnded);
                        }
                        SessionEnd::Lost(reason) => {
                            tracing::warn!(%reason, "connection lost");
                        }
                    }
                }
            }

            self.set_state(ConnState::Retrying);
            tracing::info!(delay_ms = self.cfg.retry_delay_ms, "reconnecting after delay");
            tokio::select! {
                biased;
                _ = stop.cancelled() => return self.finish(StopReason::External),
                _ = tokio::time::sleep(self.cfg.retry_delay()) => {}
            }
        }
    }

    fn finish(&self, reason: StopReason) -> RunOutcome {
        self.set_state(ConnState::Closed);
        RunOutcome::Stopped { reason }
    }

    async fn open(&self) -> Result<Socket> {
        self.set_state(ConnState::Bootstrapping);
        let target = self.bootstrap.connect_target().await?;

        self.set_state(ConnState::Connecting);
        tracing::info!(room_id = %target.room_id, "opening push connection");
        self.connector.connect(&target).await
    }

    /// Best-effort room-status query; failures are only logged.
    async fn probe(&self) {
        match self.bootstrap.room_status().await {
            Ok(s) if s.is_live() => {
                tracing::info!(user_id = %s.user_id, nickname = %s.nickname, "room is live")
            }
            Ok(s) => tracing::info!(
                user_id = %s.user_id,
                nickname = %s.nickname,
                status = s.status,
                "room is not live"
            ),
            Err(e) => tracing::warn!(code = e.kind().as_str(), error = %e, "room status probe failed"),
        }
    }
}
