//! webcast core: transport-agnostic wire primitives and the shared error type.
//!
//! This crate owns the binary push protocol spoken by the live feed: the outer
//! `PushFrame` envelope, the gzip-compressed inner response, and the business
//! event messages carried inside it. It has no runtime or network
//! dependencies so the client, tests and tooling can all share it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed frames
//! surface as `FeedError::Malformed` so a single bad frame never takes the
//! receive loop down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorKind, FeedError, Result};
