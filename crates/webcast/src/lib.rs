//! Top-level facade crate for the webcast feed client.
//!
//! Re-exports the wire primitives and the client runtime so users can depend
//! on a single crate.

pub mod core {
    pub use webcast_core::*;
}

pub mod client {
    pub use webcast_client::*;
}
