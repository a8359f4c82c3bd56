//! Connection management for netwire.
//!
//! This is the "just works" layer. A [`Connection`] pairs a typed reader
//! and a typed writer over one channel, and the TCP helpers here hand out
//! connections that are ready to use.

pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
pub mod listener;

pub use config::ConnectionConfig;
pub use connection::Connection;
pub use connector::{connect, connect_timeout, connect_with_config};
pub use error::{ConnectionError, Result};
pub use listener::ConnectionListener;
