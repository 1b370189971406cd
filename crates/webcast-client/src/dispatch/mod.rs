//! Sub-message dispatch.
//!
//! `MessageKind` is the closed set of message types this client understands,
//! `HandlerRegistry` binds enabled kinds to handlers once at startup, and
//! `Dispatcher` runs a decoded frame through the registry.

pub mod dispatcher;
pub mod kind;
pub mod registry;

pub use dispatcher::{DispatchReport, Dispatcher, FrameOutcome};
pub use kind::MessageKind;
pub use registry::{Handler, HandlerRegistry};
