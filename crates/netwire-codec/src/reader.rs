use std::io::Write;
use std::time::Duration;

use netwire_transport::Channel;
use tracing::trace;

use crate::error::Result;
use crate::link::Link;
use crate::packet::{checked_length, WireConfig};
use crate::pool::ScratchPool;
use crate::types::{Decimal, Guid};
use crate::value::WireValue;

/// Decodes typed values from a channel.
///
/// Handles partial reads internally: callers always get complete values.
/// A transport fault mid-decode tears the channel down; a malformed value
/// does not.
pub struct TypedReader<C> {
    link: Link<C>,
    pool: ScratchPool,
    config: WireConfig,
}

impl<C: Channel> TypedReader<C> {
    /// Create a reader with default configuration and the shared pool.
    pub fn new(link: Link<C>) -> Self {
        Self::with_config(link, WireConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(link: Link<C>, config: WireConfig) -> Self {
        Self {
            link,
            pool: ScratchPool::shared(),
            config,
        }
    }

    /// Use `pool` for scratch buffers instead of the shared one.
    pub fn with_pool(mut self, pool: ScratchPool) -> Self {
        self.pool = pool;
        self
    }

    /// Decode any fixed-width value.
    pub fn read_value<T: WireValue>(&mut self) -> Result<T> {
        let mut repr = T::Repr::default();
        self.link.receive_exact(repr.as_mut())?;
        T::decode(repr)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_value()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_value()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_value()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_value()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_value()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_value()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_value()
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_value()
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_value()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_value()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_value()
    }

    /// Read one raw UTF-16 code unit. Lone surrogates are returned as-is.
    pub fn read_utf16(&mut self) -> Result<u16> {
        self.read_value()
    }

    /// Read one UTF-16 code unit as a `char`.
    ///
    /// A lone surrogate is a malformed message.
    pub fn read_char(&mut self) -> Result<char> {
        self.read_value()
    }

    pub fn read_guid(&mut self) -> Result<Guid> {
        self.read_value()
    }

    pub fn read_decimal(&mut self) -> Result<Decimal> {
        self.read_value()
    }

    /// Read a time span sent as 100ns ticks.
    pub fn read_duration(&mut self) -> Result<Duration> {
        self.read_value()
    }

    /// Fill `dest` with raw bytes. No framing is read.
    pub fn read_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
        self.link.receive_exact(dest)
    }

    /// Read a length-prefixed UTF-8 string.
    ///
    /// A rejected length prefix is consumed but its payload is not. The
    /// connection stays open and the next read starts inside that payload,
    /// so discard `size` bytes with [`read_to`](Self::read_to) into
    /// [`std::io::sink`] or disconnect before reading anything else.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_length()?;
        let mut scratch = self.pool.acquire(len);
        self.link.receive_exact(&mut scratch)?;
        let text = std::str::from_utf8(&scratch)?;
        Ok(text.to_owned())
    }

    /// Read a length-prefixed packet into a new buffer.
    ///
    /// A rejected length prefix is consumed but its payload is not. The
    /// connection stays open and the next read starts inside that payload,
    /// so discard `size` bytes with [`read_to`](Self::read_to) into
    /// [`std::io::sink`] or disconnect before reading anything else.
    pub fn read_packet(&mut self) -> Result<Vec<u8>> {
        let len = self.read_length()?;
        let mut payload = vec![0u8; len];
        self.link.receive_exact(&mut payload)?;
        trace!(len, "packet received");
        Ok(payload)
    }

    /// Read a length-prefixed packet into `dest`, returning its length.
    ///
    /// The payload occupies `dest[..len]`. When `dest` is shorter than the
    /// packet it is replaced by a fresh buffer of exactly `len` bytes.
    /// A rejected length prefix leaves the stream misaligned exactly as for
    /// [`read_packet`](Self::read_packet).
    pub fn read_packet_into(&mut self, dest: &mut Vec<u8>) -> Result<usize> {
        let len = self.read_length()?;
        if dest.len() < len {
            *dest = vec![0u8; len];
        }
        self.link.receive_exact(&mut dest[..len])?;
        trace!(len, "packet received");
        Ok(len)
    }

    /// Receive exactly `len` raw bytes and stream them into `sink`.
    pub fn read_to<W: Write + ?Sized>(&mut self, sink: &mut W, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let mut chunk = self.pool.acquire(self.config.relay_chunk().min(len));
        self.link.receive_into(sink, len, &mut chunk)
    }

    fn read_length(&mut self) -> Result<usize> {
        let raw = self.read_i32()?;
        checked_length(raw, self.config.max_packet_size)
    }

    /// Whether the channel is still open.
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Shut down and release the channel shared with any writer.
    pub fn disconnect(&self) -> Result<()> {
        self.link.disconnect()
    }

    /// The link this reader draws from.
    pub fn link(&self) -> &Link<C> {
        &self.link
    }

    /// Update maximum packet size for subsequent reads.
    pub fn set_max_packet_size(&mut self, max_packet_size: usize) {
        self.config.max_packet_size = max_packet_size;
    }

    /// Current reader configuration.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }
}

impl<C> std::fmt::Debug for TypedReader<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedReader")
            .field("link", &self.link)
            .field("config", &self.config)
            .finish()
    }
}
