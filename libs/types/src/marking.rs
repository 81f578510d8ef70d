//! Pool marking bitfield
//!
//! ```text
//!  31        30 ........ 16  15 ............ 4  3   2   1   0
//! ┌──────────┬──────────────┬─────────────────┬───┬───┬───┬───┐
//! │ protocol │   reserved   │  bucket (12 b)  │inv│vol│twp│spt│
//! └──────────┴──────────────┴─────────────────┴───┴───┴───┴───┘
//! ```
//!
//! The low nibble says which pricing inputs the pool's quoter needs, the
//! bucket id selects the fee tier, and bit 31 marks protocol-owned pools.
//! Reserved bits survive a decode/encode cycle untouched.

use crate::errors::IdentifierError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compact per-pool configuration word
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marking(u32);

impl Marking {
    pub const SPOT_PRICE: u32 = 1 << 0;
    pub const TWAP: u32 = 1 << 1;
    pub const VOLATILITY: u32 = 1 << 2;
    pub const INVENTORY: u32 = 1 << 3;

    pub const BUCKET_SHIFT: u32 = 4;
    pub const BUCKET_MAX: u16 = 0x0fff;
    const BUCKET_MASK: u32 = (Self::BUCKET_MAX as u32) << Self::BUCKET_SHIFT;

    pub const RESERVED_MASK: u32 = 0x7fff_0000;
    pub const PROTOCOL_POOL: u32 = 1 << 31;

    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// 12-bit bucket id (fee tier selector)
    #[inline]
    pub const fn bucket(self) -> u16 {
        ((self.0 & Self::BUCKET_MASK) >> Self::BUCKET_SHIFT) as u16
    }

    #[inline]
    pub const fn is_protocol_pool(self) -> bool {
        self.0 & Self::PROTOCOL_POOL != 0
    }

    #[inline]
    pub const fn requires(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    /// Split into named fields. Total for every `u32`.
    pub fn decode(self) -> MarkingFields {
        MarkingFields {
            requires_spot_price: self.requires(Self::SPOT_PRICE),
            requires_twap: self.requires(Self::TWAP),
            requires_volatility: self.requires(Self::VOLATILITY),
            requires_inventory: self.requires(Self::INVENTORY),
            bucket: self.bucket(),
            reserved: (self.0 & Self::RESERVED_MASK) >> 16,
            protocol_pool: self.is_protocol_pool(),
        }
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Marking({:#010x})", self.0)
    }
}

impl fmt::Display for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Decoded view of a [`Marking`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarkingFields {
    pub requires_spot_price: bool,
    pub requires_twap: bool,
    pub requires_volatility: bool,
    pub requires_inventory: bool,
    pub bucket: u16,
    /// Bits 16..=30, shifted down
    pub reserved: u32,
    pub protocol_pool: bool,
}

impl MarkingFields {
    /// Pack back into a marking; fails only for an out-of-range bucket
    pub fn encode(&self) -> Result<Marking, IdentifierError> {
        if self.bucket > Marking::BUCKET_MAX {
            return Err(IdentifierError::BucketOutOfRange {
                bucket: self.bucket,
                max: Marking::BUCKET_MAX,
            });
        }

        let mut bits = (self.bucket as u32) << Marking::BUCKET_SHIFT;
        if self.requires_spot_price {
            bits |= Marking::SPOT_PRICE;
        }
        if self.requires_twap {
            bits |= Marking::TWAP;
        }
        if self.requires_volatility {
            bits |= Marking::VOLATILITY;
        }
        if self.requires_inventory {
            bits |= Marking::INVENTORY;
        }
        bits |= (self.reserved << 16) & Marking::RESERVED_MASK;
        if self.protocol_pool {
            bits |= Marking::PROTOCOL_POOL;
        }
        Ok(Marking(bits))
    }
}
