//! Proof-of-work targets.
//!
//! A [`Target`] is the 256-bit threshold a proof-of-work digest must not
//! exceed. Headers carry it in the 32-bit [`CompactTarget`] form (`bits`):
//! one exponent byte and a 24-bit mantissa whose top bit is a sign bit.

use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::chain::{consensus::ConsensusCodec, hashes::PowHash};

/// Mantissa sign bit of a compact target.
const COMPACT_SIGN_BIT: u32 = 0x0080_0000;
/// Mantissa bits of a compact target.
const COMPACT_MANTISSA_MASK: u32 = 0x007f_ffff;

/// A difficulty target expressed as an unsigned 256-bit integer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target(U256);

impl Target {
    /// Highest target allowed on the scrypt main and test networks,
    /// `0x00000fffff...ff`.
    pub const MAX_ATTAINABLE_MAINNET: Self =
        Target(U256([u64::MAX, u64::MAX, u64::MAX, 0x0000_0fff_ffff_ffff]));

    /// Highest target allowed on regtest, `0x7fffff...ff`.
    pub const MAX_ATTAINABLE_REGTEST: Self =
        Target(U256([u64::MAX, u64::MAX, u64::MAX, 0x7fff_ffff_ffff_ffff]));

    /// Returns `true` if `hash`, read as a little-endian 256-bit integer, is
    /// less than or equal to this target.
    pub fn is_met_by(&self, hash: &PowHash) -> bool {
        U256::from_little_endian(hash.as_byte_array()) <= self.0
    }

    /// Decodes a compact target.
    ///
    /// The target is `mantissa * 256^(exponent - 3)`. Returns `None` when the
    /// encoding is negative (sign bit set), decodes to zero, or overflows 256
    /// bits; none of those can be met by a proof-of-work digest.
    pub fn from_compact(compact: CompactTarget) -> Option<Self> {
        let n = compact.0;
        let exponent = n >> 24;
        let mantissa = n & COMPACT_MANTISSA_MASK;

        if n & COMPACT_SIGN_BIT != 0 {
            return None;
        }

        if mantissa == 0 {
            return None;
        }

        let overflow = exponent > 34
            || (mantissa > 0xff && exponent > 33)
            || (mantissa > 0xffff && exponent > 32);
        if overflow {
            return None;
        }

        let base = U256::from(mantissa);

        #[allow(clippy::arithmetic_side_effects, reason = "Shift amounts are bounded above")]
        let target = if exponent <= 3 {
            let shift_bits = 3u32.checked_sub(exponent)?.checked_mul(8)?;
            base >> shift_bits
        } else {
            let shift_bits = exponent.checked_sub(3)?.checked_mul(8)?;
            base << shift_bits
        };

        if target.is_zero() {
            return None;
        }

        Some(Target(target))
    }
}

impl fmt::LowerHex for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Compact representation of a [`Target`], as carried in block headers.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ConsensusCodec,
)]
pub struct CompactTarget(u32);

impl CompactTarget {
    /// Wraps a raw `bits` value.
    pub const fn from_consensus(bits: u32) -> Self {
        CompactTarget(bits)
    }

    /// Returns the raw `bits` value.
    pub const fn to_consensus(self) -> u32 {
        self.0
    }
}

impl From<u32> for CompactTarget {
    fn from(bits: u32) -> Self {
        CompactTarget(bits)
    }
}
