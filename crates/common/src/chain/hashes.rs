//! Hash functions used by block headers.
//!
//! Two unrelated digests are applied to the same 80-byte header preimage:
//! [`hash256`] gives the block its identity, and [`scrypt_pow`] gives the
//! value compared against the difficulty target. They must never be swapped.

use std::fmt;

pub use bitcoin::hashes::{Hash, sha256d};
use scrypt::{Params as ScryptParams, scrypt};

/// log2 of the scrypt cost parameter N (N = 1024).
pub const SCRYPT_LOG_N: u8 = 10;
/// scrypt block size parameter r.
pub const SCRYPT_R: u32 = 1;
/// scrypt parallelization parameter p.
pub const SCRYPT_P: u32 = 1;
/// Length of a proof-of-work digest in bytes.
pub const POW_HASH_LEN: usize = 32;

/// Double SHA-256 of `data`.
pub fn hash256(data: &[u8]) -> sha256d::Hash {
    sha256d::Hash::hash(data)
}

/// scrypt(N=1024, r=1, p=1) of `data`, using `data` as both password and salt.
pub fn scrypt_pow(data: &[u8]) -> PowHash {
    let mut output = [0u8; POW_HASH_LEN];
    #[allow(clippy::expect_used, reason = "Constant parameters can't fail")]
    let params = ScryptParams::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, POW_HASH_LEN)
        .expect("Constant parameters can't fail");
    #[allow(clippy::expect_used, reason = "Output length matches the parameters")]
    scrypt(data, data, &params, &mut output).expect("Output length matches the parameters");
    PowHash(output)
}

/// The digest a chain scores proof-of-work with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PowAlgorithm {
    /// Memory-hard scrypt digest.
    #[default]
    Scrypt,
    /// Double SHA-256, the same digest as the identity hash.
    Sha256d,
}

impl PowAlgorithm {
    /// Computes the proof-of-work digest of `data` with this algorithm.
    pub fn digest(self, data: &[u8]) -> PowHash {
        match self {
            PowAlgorithm::Scrypt => scrypt_pow(data),
            PowAlgorithm::Sha256d => PowHash(hash256(data).to_byte_array()),
        }
    }
}

/// A proof-of-work digest in internal byte order.
///
/// The bytes are read as a little-endian 256-bit integer when compared with
/// a target, so the display form is byte-reversed like block hashes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PowHash([u8; POW_HASH_LEN]);

impl PowHash {
    /// Wraps raw digest bytes.
    pub const fn from_byte_array(bytes: [u8; POW_HASH_LEN]) -> Self {
        PowHash(bytes)
    }

    /// Returns the raw digest bytes.
    pub const fn as_byte_array(&self) -> &[u8; POW_HASH_LEN] {
        &self.0
    }

    /// Returns the raw digest bytes by value.
    pub const fn to_byte_array(self) -> [u8; POW_HASH_LEN] {
        self.0
    }
}

impl fmt::Display for PowHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PowHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PowHash({self})")
    }
}

impl AsRef<[u8]> for PowHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
