//! # mcpbridge-net
//!
//! The transport: a [`Server`] that owns the listening socket and a
//! connection pool, a [`protocol::FrameReader`] that turns a raw byte
//! stream into one JSON request at a time, and the per-connection
//! [`worker::run_connection`] loop that ties framing to
//! `mcpbridge-core`'s [`mcpbridge_core::Dispatcher`].

pub mod error;
pub mod protocol;
pub mod server;
pub mod worker;

pub use error::ProtocolError;
pub use protocol::{FrameReader, MAX_FRAME_BYTES, READ_CHUNK_BYTES};
pub use server::Server;
