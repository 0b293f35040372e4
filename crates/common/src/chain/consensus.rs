//! Consensus encoding and the proof-of-work acceptance rule.

mod params;

pub use bitcoin::consensus::encode::{
    Decodable, Encodable, Error as EncodeDecodeError, VarInt, deserialize, serialize,
};
pub use litecore_derive::ConsensusCodec;
pub use params::Params;

use crate::chain::{
    hashes::PowHash,
    pow::{CompactTarget, Target},
};

/// Checks a proof-of-work digest against the target encoded in `bits`.
///
/// A negative, zero or overflowing compact target fails; otherwise the
/// digest passes when it is at or below the target.
pub fn verify_pow(hash: &PowHash, bits: CompactTarget) -> bool {
    match Target::from_compact(bits) {
        Some(target) => target.is_met_by(hash),
        None => false,
    }
}

/// Like [`verify_pow`], but also rejects targets easier than `pow_limit`.
pub fn verify_pow_with_limit(hash: &PowHash, bits: CompactTarget, pow_limit: Target) -> bool {
    match Target::from_compact(bits) {
        Some(target) if target <= pow_limit => target.is_met_by(hash),
        _ => false,
    }
}
