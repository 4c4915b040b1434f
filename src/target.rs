//! Compact difficulty target decoding
//!
//! The compact form packs a target into 32 bits: the top byte is the length
//! of the target in bytes, the low three bytes are its most significant
//! bytes. A candidate hash is read byte-reversed as a big-endian integer and
//! must be strictly below the target.

use crate::types::Hash256;
use crate::{Error, Result};
use num_bigint::BigUint;
use num_traits::Zero;
use std::cmp::Ordering;
use std::fmt;

/// Difficulty threshold decoded from compact bits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyTarget {
    bits: u32,
    value: BigUint,
    /// Big-endian target, left padded to 32 bytes
    threshold: [u8; 32],
}

impl DifficultyTarget {
    /// Smallest exponent whose mantissa needs no right shift
    pub const MIN_EXPONENT: u32 = 3;
    /// Largest exponent whose target still fits a 256-bit hash
    pub const MAX_EXPONENT: u32 = 32;

    /// Decode compact bits
    ///
    /// The target is `mantissa << 8 * (exponent - 3)`. Exponents outside
    /// `3..=32` and a zero mantissa are rejected.
    pub fn from_compact(bits: u32) -> Result<Self> {
        let exponent = bits >> 24;
        let mantissa = bits & 0x00ff_ffff;

        if exponent < Self::MIN_EXPONENT {
            return Err(Error::invalid_bits(
                bits,
                format!("exponent {} is below {}", exponent, Self::MIN_EXPONENT),
            ));
        }
        if exponent > Self::MAX_EXPONENT {
            return Err(Error::invalid_bits(
                bits,
                format!("exponent {} exceeds {}", exponent, Self::MAX_EXPONENT),
            ));
        }
        if mantissa == 0 {
            return Err(Error::invalid_bits(bits, "mantissa is zero, no hash can meet it"));
        }

        let value = BigUint::from(mantissa) << (8 * (exponent - Self::MIN_EXPONENT) as usize);

        let be = value.to_bytes_be();
        let mut threshold = [0u8; 32];
        threshold[32 - be.len()..].copy_from_slice(&be);

        Ok(Self {
            bits,
            value,
            threshold,
        })
    }

    /// Decode compact bits given as hex, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_compact(crate::utils::parse_compact_bits(s)?)
    }

    /// The compact encoding this target was decoded from
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The exact target value
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Number of significant bytes in the target
    pub fn byte_len(&self) -> usize {
        if self.value.is_zero() {
            0
        } else {
            ((self.value.bits() + 7) / 8) as usize
        }
    }

    /// Target as 32 big-endian bytes
    pub fn to_bytes_be(&self) -> [u8; 32] {
        self.threshold
    }

    /// Whether `hash`, read byte-reversed as a big-endian integer, is below the target
    #[inline]
    pub fn is_met_by(&self, hash: &Hash256) -> bool {
        hash.as_bytes().iter().rev().cmp(self.threshold.iter()) == Ordering::Less
    }
}

impl fmt::Display for DifficultyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.threshold))
    }
}
