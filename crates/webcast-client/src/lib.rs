//! Webcast feed client library entry.
//!
//! Wires session bootstrap, the push transport, frame dispatch, event
//! handlers and the connection lifecycle into one client. Consumed by the
//! binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod bootstrap;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod handlers;
pub mod heartbeat;
pub mod signer;
pub mod sink;
pub mod state;
pub mod transport;
