use std::io::{ErrorKind as IoErrorKind, Read};
use std::time::Duration;

use bytes::BufMut;
use netwire_transport::Channel;
use tracing::trace;

use crate::error::{Result, WireError};
use crate::link::Link;
use crate::packet::{length_prefix, WireConfig};
use crate::pool::ScratchPool;
use crate::types::{Decimal, Guid};
use crate::value::WireValue;

/// Encodes typed values onto a channel.
pub struct TypedWriter<C> {
    link: Link<C>,
    pool: ScratchPool,
    config: WireConfig,
}

impl<C: Channel> TypedWriter<C> {
    /// Create a writer with default configuration and the shared pool.
    pub fn new(link: Link<C>) -> Self {
        Self::with_config(link, WireConfig::default())
    }

    /// Create a writer with explicit configuration.
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

    /// Encode and send any fixed-width value.
    pub fn write_value<T: WireValue>(&mut self, value: &T) -> Result<()> {
        let repr = value.encode()?;
        self.link.send_exact(repr.as_ref())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_value(&value)
    }

    /// Send one raw UTF-16 code unit.
    pub fn write_utf16(&mut self, unit: u16) -> Result<()> {
        self.write_value(&unit)
    }

    /// Send a `char` as one UTF-16 code unit.
    ///
    /// Characters outside the basic multilingual plane need two units and
    /// fail with an encoding error; nothing is sent.
    pub fn write_char(&mut self, value: char) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_guid(&mut self, value: Guid) -> Result<()> {
        self.write_value(&value)
    }

    pub fn write_decimal(&mut self, value: Decimal) -> Result<()> {
        self.write_value(&value)
    }

    /// Send a time span as 100ns ticks.
    pub fn write_duration(&mut self, value: Duration) -> Result<()> {
        self.write_value(&value)
    }

    /// Send raw bytes with no framing.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.link.send_exact(bytes)
    }

    /// Send a length-prefixed UTF-8 string as one contiguous transfer.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let prefix = length_prefix(value.len(), self.config.max_packet_size)?;

        let mut scratch = self.pool.acquire_empty();
        scratch.reserve(4 + value.len());
        scratch.put_i32_le(prefix);
        scratch.put_slice(value.as_bytes());
        self.link.send_exact(&scratch)
    }

    /// Send a length-prefixed packet.
    pub fn write_packet(&mut self, payload: &[u8]) -> Result<()> {
        let prefix = length_prefix(payload.len(), self.config.max_packet_size)?;
        self.link.send_exact(&prefix.to_le_bytes())?;
        self.link.send_exact(payload)?;
        trace!(len = payload.len(), "packet sent");
        Ok(())
    }

    /// Relay bytes from `source` to the channel, returning how many were
    /// sent.
    ///
    /// With `Some(len)` exactly `len` bytes are relayed and a source that
    /// ends early is an error. With `None` the source is relayed until it
    /// reports end of stream. Chunks are sent as soon as they are read.
    pub fn write_from<R: Read + ?Sized>(
        &mut self,
        source: &mut R,
        len: Option<u64>,
    ) -> Result<u64> {
        let chunk_size = match len {
            Some(0) => return Ok(0),
            Some(n) => usize::try_from(n)
                .map_or(self.config.relay_chunk(), |n| n.min(self.config.relay_chunk())),
            None => self.config.relay_chunk(),
        };
        let mut chunk = self.pool.acquire(chunk_size);

        let mut sent = 0u64;
        loop {
            let want = match len {
                Some(n) if sent == n => break,
                Some(n) => usize::try_from(n - sent).map_or(chunk.len(), |r| r.min(chunk.len())),
                None => chunk.len(),
            };

            let read = match source.read(&mut chunk[..want]) {
                Ok(read) => read,
                Err(err) if err.kind() == IoErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Stream(err)),
            };

            if read == 0 {
                match len {
                    Some(expected) => {
                        return Err(WireError::SourceExhausted {
                            expected,
                            actual: sent,
                        })
                    }
                    None => break,
                }
            }

            self.link.send_exact(&chunk[..read])?;
            sent += read as u64;
        }

        trace!(sent, "stream relayed");
        Ok(sent)
    }

    /// Whether the channel is still open.
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Shut down and release the channel shared with any reader.
    pub fn disconnect(&self) -> Result<()> {
        self.link.disconnect()
    }

    /// The link this writer sends through.
    pub fn link(&self) -> &Link<C> {
        &self.link
    }

    /// Update maximum packet size for subsequent writes.
    pub fn set_max_packet_size(&mut self, max_packet_size: usize) {
        self.config.max_packet_size = max_packet_size;
    }

    /// Current writer configuration.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }
}

impl<C> std::fmt::Debug for TypedWriter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedWriter")
            .field("link", &self.link)
            .field("config", &self.config)
            .finish()
    }
}
