//! Typed exact-transfer reading and writing over a byte channel.
//!
//! Every value moves with an exact transfer: partial sends and receives are
//! looped until the whole value has crossed the channel. Variable-length
//! data (strings, packets) travels behind a 4-byte little-endian signed
//! length prefix:
//! - fixed-width values are little-endian, with no padding between them
//! - strings are UTF-8 bytes after the prefix
//! - packets are opaque payloads after the prefix
//!
//! Readers and writers built over the same [`Link`] share one channel. A
//! transport fault in either tears the channel down for both.

pub mod error;
pub mod link;
pub mod packet;
pub mod pool;
pub mod reader;
pub mod types;
pub mod value;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AttachError, ErrorKind, Result, WireError};
pub use link::Link;
pub use packet::{
    decode_packet, encode_packet, WireConfig, DEFAULT_MAX_PACKET, DEFAULT_RELAY_CHUNK,
    LENGTH_PREFIX_SIZE,
};
pub use pool::{Scratch, ScratchPool};
pub use reader::TypedReader;
pub use types::{Decimal, Guid, ParseGuidError, MAX_DECIMAL_SCALE};
pub use value::WireValue;
pub use writer::TypedWriter;
