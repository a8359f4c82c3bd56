//! Blocking byte-channel abstraction.
//!
//! Provides the contract every higher netwire layer is written against:
//! - [`Channel`]: partial send/receive, shutdown and a connected query
//! - [`TcpTransport`]: bind/accept/connect helpers producing TCP channels
//!
//! This is the lowest layer of netwire. Everything else builds on top of
//! an already-connected [`Channel`].

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{TcpOptions, TcpTransport};
pub use traits::Channel;
