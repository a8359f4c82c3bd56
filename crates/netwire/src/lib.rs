//! Exact-transfer typed values and length-prefixed packets over blocking
//! byte channels.
//!
//! netwire moves fixed-width little-endian values, length-prefixed UTF-8
//! strings and opaque packets across any stream channel, looping partial
//! sends and receives until every byte has crossed. A transport fault
//! shuts the channel down for every reader and writer sharing it.
//!
//! # Crate Structure
//!
//! - [`transport`] — Channel contract and TCP helpers
//! - [`codec`] — Typed reader/writer, packet framing, wire value types
//! - [`connection`] — Connection facade and TCP connect/accept (behind `connection` feature)

/// Re-export transport types.
pub mod transport {
    pub use netwire_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use netwire_codec::*;
}

/// Re-export connection types (requires `connection` feature).
#[cfg(feature = "connection")]
pub mod connection {
    pub use netwire_connection::*;
}
