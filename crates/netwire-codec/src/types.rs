//! Value types with a fixed 16-byte wire layout.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WireError};

/// A 128-bit GUID.
///
/// On the wire the first three groups are little-endian and the last eight
/// bytes are sent as-is:
///
/// ```text
/// ┌────────────┬────────────┬────────────┬─────────────────┐
/// │ data1 (4B) │ data2 (2B) │ data3 (2B) │ data4 (8B)      │
/// │ LE         │ LE         │ LE         │ in order        │
/// └────────────┴────────────┴────────────┴─────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    /// The all-zero GUID.
    pub const NIL: Guid = Guid {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    /// Build a GUID from its four groups.
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Build a GUID whose hyphenated text reads as the hex digits of `value`.
    pub const fn from_u128(value: u128) -> Self {
        Self {
            data1: (value >> 96) as u32,
            data2: (value >> 80) as u16,
            data3: (value >> 64) as u16,
            data4: (value as u64).to_be_bytes(),
        }
    }

    /// Inverse of [`Guid::from_u128`].
    pub const fn as_u128(&self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | u64::from_be_bytes(self.data4) as u128
    }

    /// Wire bytes.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..4].copy_from_slice(&self.data1.to_le_bytes());
        out[4..6].copy_from_slice(&self.data2.to_le_bytes());
        out[6..8].copy_from_slice(&self.data3.to_le_bytes());
        out[8..16].copy_from_slice(&self.data4);
        out
    }

    /// Parse wire bytes. Every bit pattern is a valid GUID.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..16]);
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }

    pub fn data1(&self) -> u32 {
        self.data1
    }

    pub fn data2(&self) -> u16 {
        self.data2
    }

    pub fn data3(&self) -> u16 {
        self.data3
    }

    pub fn data4(&self) -> [u8; 8] {
        self.data4
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

/// Error returned when text is not a hyphenated GUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid GUID text: {0:?}")]
pub struct ParseGuidError(String);

impl FromStr for Guid {
    type Err = ParseGuidError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim_start_matches('{').trim_end_matches('}');
        let groups: Vec<&str> = trimmed.split('-').collect();
        let lengths = [8, 4, 4, 4, 12];
        if groups.len() != lengths.len()
            || groups
                .iter()
                .zip(lengths)
                .any(|(g, len)| g.len() != len || !g.bytes().all(|b| b.is_ascii_hexdigit()))
        {
            return Err(ParseGuidError(s.to_string()));
        }

        let hex: String = groups.concat();
        let value = u128::from_str_radix(&hex, 16).map_err(|_| ParseGuidError(s.to_string()))?;
        Ok(Guid::from_u128(value))
    }
}

/// Largest scale a [`Decimal`] may carry.
pub const MAX_DECIMAL_SCALE: u32 = 28;

const SIGN_MASK: u32 = 0x8000_0000;
const SCALE_MASK: u32 = 0x00FF_0000;
const SCALE_SHIFT: u32 = 16;
const MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// A 128-bit decimal: a 96-bit unsigned magnitude, a sign and a power-of-ten
/// scale between 0 and 28.
///
/// Sent as four little-endian 32-bit words: flags (sign in bit 31, scale in
/// bits 16-23), then the low, middle and high magnitude words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    flags: u32,
    lo: u32,
    mid: u32,
    hi: u32,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        flags: 0,
        lo: 0,
        mid: 0,
        hi: 0,
    };

    /// `mantissa * 10^-scale`.
    ///
    /// Fails when `|mantissa|` needs more than 96 bits or `scale` exceeds
    /// [`MAX_DECIMAL_SCALE`].
    pub fn try_new(mantissa: i128, scale: u32) -> Result<Self> {
        if scale > MAX_DECIMAL_SCALE {
            return Err(WireError::encoding(
                "decimal",
                format!("scale {scale} exceeds {MAX_DECIMAL_SCALE}"),
            ));
        }
        let magnitude = mantissa.unsigned_abs();
        if magnitude > MAX_MANTISSA {
            return Err(WireError::encoding(
                "decimal",
                "mantissa does not fit in 96 bits",
            ));
        }

        let mut flags = scale << SCALE_SHIFT;
        if mantissa < 0 {
            flags |= SIGN_MASK;
        }
        Ok(Self {
            flags,
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: (magnitude >> 64) as u32,
        })
    }

    /// Validate four wire words `[flags, lo, mid, hi]`.
    pub fn from_words(words: [u32; 4]) -> Result<Self> {
        let [flags, lo, mid, hi] = words;
        if flags & !(SIGN_MASK | SCALE_MASK) != 0 {
            return Err(WireError::invalid_value(
                "decimal",
                format!("reserved flag bits set ({flags:#010x})"),
            ));
        }
        let scale = (flags & SCALE_MASK) >> SCALE_SHIFT;
        if scale > MAX_DECIMAL_SCALE {
            return Err(WireError::invalid_value(
                "decimal",
                format!("scale {scale} exceeds {MAX_DECIMAL_SCALE}"),
            ));
        }
        Ok(Self { flags, lo, mid, hi })
    }

    /// Wire words `[flags, lo, mid, hi]`.
    pub fn to_words(&self) -> [u32; 4] {
        [self.flags, self.lo, self.mid, self.hi]
    }

    /// Signed 96-bit mantissa.
    pub fn mantissa(&self) -> i128 {
        let magnitude =
            ((self.hi as i128) << 64) | ((self.mid as i128) << 32) | self.lo as i128;
        if self.is_sign_negative() {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn scale(&self) -> u32 {
        (self.flags & SCALE_MASK) >> SCALE_SHIFT
    }

    /// Sign bit as sent. A negative zero keeps its sign.
    pub fn is_sign_negative(&self) -> bool {
        self.flags & SIGN_MASK != 0
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        let magnitude = value.unsigned_abs();
        Self {
            flags: if value < 0 { SIGN_MASK } else { 0 },
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: 0,
        }
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self {
            flags: 0,
            lo: value as u32,
            mid: (value >> 32) as u32,
            hi: 0,
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa().unsigned_abs().to_string();
        let scale = self.scale() as usize;
        let sign = if self.is_sign_negative() { "-" } else { "" };

        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int}.{frac}")
    }
}
