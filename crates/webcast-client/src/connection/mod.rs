//! Connection lifecycle.
//!
//! `ConnectionManager` drives `Init -> Bootstrapping -> Connecting -> Open ->
//! Closing -> {Closed | Retrying}` with `Failed` as the terminal state once
//! the retry budget is spent. The current state is published on a `watch`
//! channel. `Closing` is published before teardown starts and covers the
//! heartbeat join, the close handshake and the room-status probe.

mod manager;
mod session;

use tokio_util::sync::CancellationToken;
use webcast_core::error::{FeedError, Result};

pub use manager::ConnectionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Init,
    Bootstrapping,
    Connecting,
    Open,
    Closing,
    Closed,
    Retrying,
    Failed,
}

impl ConnState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnState::Init => "init",
            ConnState::Bootstrapping => "bootstrapping",
            ConnState::Connecting => "connecting",
            ConnState::Open => "open",
            ConnState::Closing => "closing",
            ConnState::Closed => "closed",
            ConnState::Retrying => "retrying",
            ConnState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `StopHandle::stop` was called.
    External,
    /// The room announced the end of the broadcast.
    BroadcastEnded,
}

/// How `ConnectionManager::run` ended. Only `Exhausted` is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Stopped { reason: StopReason },
    Exhausted { attempts: u32 },
}

impl RunOutcome {
    /// `Exhausted` as `FeedError::Exhausted`, anything else as the stop reason.
    pub fn into_result(self) -> Result<StopReason> {
        match self {
            RunOutcome::Stopped { reason } => Ok(reason),
            RunOutcome::Exhausted { attempts } => Err(FeedError::Exhausted { attempts }),
        }
    }
}

/// Cloneable external stop request.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn only_exhaustion_is_an_error() {
        let stopped = RunOutcome::Stopped {
            reason: StopReason::BroadcastEnded,
        };
        assert!(matches!(stopped.into_result(), Ok(StopReason::BroadcastEnded)));

        let err = RunOutcome::Exhausted { attempts: 5 }.into_result().unwrap_err();
        assert_eq!(err.kind().as_str(), "EXHAUSTED");
        assert_eq!(err.to_string(), "gave up after 5 connection attempts");
    }
}
