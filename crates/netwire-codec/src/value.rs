//! Fixed-width wire values.
//!
//! Every value here has an exact byte width and a little-endian layout, so
//! it can be encoded into a stack array and moved with one exact transfer.

use std::time::Duration;

use crate::error::{Result, WireError};
use crate::types::{Decimal, Guid};

/// Nanoseconds per tick of a wire time span.
pub const NANOS_PER_TICK: u128 = 100;

/// A value with a fixed-width wire representation.
pub trait WireValue: Sized {
    /// Raw bytes as they travel, e.g. `[u8; 4]` for an `i32`.
    type Repr: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// Produce the wire bytes.
    fn encode(&self) -> Result<Self::Repr>;

    /// Interpret wire bytes.
    fn decode(repr: Self::Repr) -> Result<Self>;
}

macro_rules! little_endian_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WireValue for $ty {
                type Repr = [u8; std::mem::size_of::<$ty>()];

                fn encode(&self) -> Result<Self::Repr> {
                    Ok(self.to_le_bytes())
                }

                fn decode(repr: Self::Repr) -> Result<Self> {
                    Ok(<$ty>::from_le_bytes(repr))
                }
            }
        )*
    };
}

little_endian_value!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl WireValue for bool {
    type Repr = [u8; 1];

    fn encode(&self) -> Result<Self::Repr> {
        Ok([u8::from(*self)])
    }

    /// Any non-zero byte reads as `true`.
    fn decode(repr: Self::Repr) -> Result<Self> {
        Ok(repr[0] != 0)
    }
}

/// A `char` travels as one UTF-16 code unit.
impl WireValue for char {
    type Repr = [u8; 2];

    fn encode(&self) -> Result<Self::Repr> {
        let unit = u16::try_from(u32::from(*self)).map_err(|_| {
            WireError::encoding(
                "char",
                format!("{:?} needs a surrogate pair (U+{:X})", self, u32::from(*self)),
            )
        })?;
        Ok(unit.to_le_bytes())
    }

    fn decode(repr: Self::Repr) -> Result<Self> {
        let unit = u16::from_le_bytes(repr);
        char::from_u32(u32::from(unit)).ok_or_else(|| {
            WireError::invalid_value("char", format!("lone surrogate code unit {unit:#06x}"))
        })
    }
}

impl WireValue for Guid {
    type Repr = [u8; 16];

    fn encode(&self) -> Result<Self::Repr> {
        Ok(self.to_bytes())
    }

    fn decode(repr: Self::Repr) -> Result<Self> {
        Ok(Guid::from_bytes(repr))
    }
}

impl WireValue for Decimal {
    type Repr = [u8; 16];

    fn encode(&self) -> Result<Self::Repr> {
        let mut out = [0u8; 16];
        for (slot, word) in out.chunks_exact_mut(4).zip(self.to_words()) {
            slot.copy_from_slice(&word.to_le_bytes());
        }
        Ok(out)
    }

    fn decode(repr: Self::Repr) -> Result<Self> {
        let mut words = [0u32; 4];
        for (word, chunk) in words.iter_mut().zip(repr.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Decimal::from_words(words)
    }
}

/// A `Duration` travels as a signed 64-bit count of 100ns ticks.
impl WireValue for Duration {
    type Repr = [u8; 8];

    fn encode(&self) -> Result<Self::Repr> {
        let ticks = i64::try_from(self.as_nanos() / NANOS_PER_TICK).map_err(|_| {
            WireError::encoding("duration", format!("{self:?} overflows 64-bit ticks"))
        })?;
        Ok(ticks.to_le_bytes())
    }

    fn decode(repr: Self::Repr) -> Result<Self> {
        let ticks = i64::from_le_bytes(repr);
        let ticks = u64::try_from(ticks).map_err(|_| {
            WireError::invalid_value("duration", format!("negative tick count {ticks}"))
        })?;
        Ok(Duration::from_nanos(ticks) * NANOS_PER_TICK as u32)
    }
}
