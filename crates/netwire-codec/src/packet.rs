use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Length prefix: a 4-byte little-endian signed count of payload bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default bound on packet and string payloads: 16 MiB.
pub const DEFAULT_MAX_PACKET: usize = 16 * 1024 * 1024;

/// Default scratch chunk for stream relays: 8 KiB.
pub const DEFAULT_RELAY_CHUNK: usize = 8 * 1024;

/// Hard ceiling imposed by the signed 32-bit prefix.
pub const PREFIX_LIMIT: usize = i32::MAX as usize;

/// Encode a packet into a buffer.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┐
/// │ Length       │ Payload          │
/// │ (4B LE i32)  │ (Length bytes)   │
/// └──────────────┴──────────────────┘
/// ```
pub fn encode_packet(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let prefix = length_prefix(payload.len(), PREFIX_LIMIT)?;
    dst.reserve(LENGTH_PREFIX_SIZE + payload.len());
    dst.put_i32_le(prefix);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a packet from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// The prefix is validated as soon as it is available, before waiting for
/// the payload. On success, consumes the packet bytes from the buffer.
pub fn decode_packet(src: &mut BytesMut, max_packet: usize) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let raw = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
    let payload_len = checked_length(raw, max_packet)?;

    if src.len() < LENGTH_PREFIX_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(LENGTH_PREFIX_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Validate a decoded length prefix against `max`.
pub(crate) fn checked_length(raw: i32, max: usize) -> Result<usize> {
    let len = usize::try_from(raw).map_err(|_| WireError::NegativeLength(raw))?;
    let max = max.min(PREFIX_LIMIT);
    if len > max {
        return Err(WireError::LengthTooLarge { size: len, max });
    }
    Ok(len)
}

/// Turn an outgoing payload length into its prefix, refusing anything over
/// `max` before a single byte is sent.
pub(crate) fn length_prefix(len: usize, max: usize) -> Result<i32> {
    let max = max.min(PREFIX_LIMIT);
    if len > max {
        return Err(WireError::PayloadTooLarge { size: len, max });
    }
    i32::try_from(len).map_err(|_| WireError::PayloadTooLarge { size: len, max })
}

/// Configuration shared by readers and writers.
#[derive(Debug, Clone)]
pub struct WireConfig {
    /// Largest packet or string payload accepted in either direction.
    /// Default: 16 MiB. Values above `i32::MAX` are clamped to it.
    pub max_packet_size: usize,
    /// Scratch chunk size for stream relays. Default: 8 KiB.
    pub relay_chunk_size: usize,
}

impl WireConfig {
    /// No bound beyond what the 32-bit prefix can express.
    pub fn unbounded() -> Self {
        Self {
            max_packet_size: PREFIX_LIMIT,
            ..Self::default()
        }
    }

    pub(crate) fn relay_chunk(&self) -> usize {
        self.relay_chunk_size.max(1)
    }
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET,
            relay_chunk_size: DEFAULT_RELAY_CHUNK,
        }
    }
}
