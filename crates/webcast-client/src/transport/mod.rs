//! Transport layer (client websocket).
//!
//! `codec` decodes each websocket message once into an `Inbound` value;
//! `ws` opens the socket and hands back split, error-mapped halves.

pub mod codec;
pub mod ws;

pub use codec::Inbound;
pub use ws::{Connector, FrameSink, FrameStream, Socket, WsConnector};
