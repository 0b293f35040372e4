//! The block header core.
//!
//! A [`BlockHeader`] owns the six consensus fields, a mutability flag and the
//! derived-value caches. Caches are write-once cells that are only filled
//! while the header is immutable and are emptied by [`BlockHeader::refresh`].

mod display;

use std::{fmt, sync::OnceLock};

use bitcoin::{BlockHash, TxMerkleNode};
pub use display::{DisplayHeader, HeaderOptions};
use thiserror::Error;
use tracing::{debug, trace};

use crate::chain::{
    consensus::{
        self, ConsensusCodec, Decodable, Encodable, EncodeDecodeError, Params, verify_pow,
        verify_pow_with_limit,
    },
    hashes::{Hash, PowAlgorithm, PowHash, hash256, scrypt_pow},
    inventory::Inventory,
    io::{Error as IoError, ErrorKind, Read, Write},
    pow::{CompactTarget, Target},
};

/// Size of the canonical header encoding in bytes.
pub const HEADER_SIZE: usize = 80;

/// Errors raised while constructing a header.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The input object is absent or is not an object at all.
    #[error("Invalid header data: {0}")]
    InvalidData(&'static str),
    /// A required field is missing or has the wrong shape.
    #[error("Field `{field}` must be {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
    /// Fewer than 80 bytes were available.
    #[error("Truncated header: expected 80 bytes")]
    TruncatedInput,
    /// Bytes remained after an exact decode.
    #[error("{0} trailing bytes after header")]
    TrailingData(usize),
    /// The underlying codec failed for a reason other than running out of input.
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodeDecodeError),
}

impl HeaderError {
    fn from_decode(err: EncodeDecodeError) -> Self {
        match err {
            EncodeDecodeError::Io(ref io) if io.kind() == ErrorKind::UnexpectedEof => {
                HeaderError::TruncatedInput
            }
            other => HeaderError::Encoding(other),
        }
    }
}

/// The six consensus-visible header fields, in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ConsensusCodec)]
pub struct HeaderFields {
    /// Block version, always handled as unsigned.
    pub version: u32,
    /// Identity hash of the previous block; all zeros for a genesis header.
    pub prev_block: BlockHash,
    /// Merkle root of the block's transactions.
    pub merkle_root: TxMerkleNode,
    /// Seconds since the Unix epoch.
    pub time: u32,
    /// Compact difficulty target.
    pub bits: CompactTarget,
    /// Proof-of-work search value.
    pub nonce: u32,
}

/// A block header with lazily cached identity hash and sizes.
///
/// The size caches describe the owning block, so a clone starts without them.
pub struct BlockHeader {
    fields: HeaderFields,
    mutable: bool,
    hash: OnceLock<BlockHash>,
    hash_hex: OnceLock<String>,
    size: OnceLock<usize>,
    witness_size: OnceLock<usize>,
}

impl BlockHeader {
    /// Creates an immutable header from its consensus fields.
    pub fn new(fields: HeaderFields) -> Self {
        Self::from_fields(fields, false)
    }

    /// Creates a header, choosing whether derived values may be cached.
    pub fn from_fields(fields: HeaderFields, mutable: bool) -> Self {
        BlockHeader {
            fields,
            mutable,
            hash: OnceLock::new(),
            hash_hex: OnceLock::new(),
            size: OnceLock::new(),
            witness_size: OnceLock::new(),
        }
    }

    /// Creates a header from structured options in internal byte order.
    pub fn from_options(options: HeaderOptions) -> Self {
        let (fields, mutable) = options.into_parts();
        Self::from_fields(fields, mutable)
    }

    /// Reads exactly 80 bytes from `reader`.
    ///
    /// Running out of input maps to [`HeaderError::TruncatedInput`].
    pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<Self, HeaderError> {
        HeaderFields::consensus_decode_from_finite_reader(reader)
            .map(Self::new)
            .map_err(HeaderError::from_decode)
    }

    /// Decodes a header from the front of `bytes`, ignoring anything after
    /// the first 80 bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < HEADER_SIZE {
            return Err(HeaderError::TruncatedInput);
        }
        let mut reader = bytes;
        Self::read_header(&mut reader)
    }

    /// Decodes a header that must be exactly 80 bytes long.
    pub fn decode_exact(bytes: &[u8]) -> Result<Self, HeaderError> {
        match bytes.len().checked_sub(HEADER_SIZE) {
            None => Err(HeaderError::TruncatedInput),
            Some(0) => Self::decode(bytes),
            Some(extra) => Err(HeaderError::TrailingData(extra)),
        }
    }

    /// Writes the canonical 80-byte encoding and returns the byte count.
    pub fn write_header<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        self.fields.consensus_encode(writer)
    }

    /// The canonical 80-byte encoding; the preimage of both hashes.
    pub fn encode(&self) -> Vec<u8> {
        consensus::serialize(&self.fields)
    }

    /// The consensus fields.
    pub fn fields(&self) -> &HeaderFields {
        &self.fields
    }

    pub fn version(&self) -> u32 {
        self.fields.version
    }

    pub fn prev_block(&self) -> BlockHash {
        self.fields.prev_block
    }

    pub fn merkle_root(&self) -> TxMerkleNode {
        self.fields.merkle_root
    }

    pub fn time(&self) -> u32 {
        self.fields.time
    }

    pub fn bits(&self) -> CompactTarget {
        self.fields.bits
    }

    pub fn nonce(&self) -> u32 {
        self.fields.nonce
    }

    /// Returns `true` if the previous block hash is all zeros.
    pub fn is_genesis(&self) -> bool {
        self.fields.prev_block == BlockHash::all_zeros()
    }

    /// The target decoded from `bits`, or `None` if `bits` is negative, zero or overflows.
    pub fn target(&self) -> Option<Target> {
        Target::from_compact(self.fields.bits)
    }

    /// Returns `true` if derived values are recomputed on every call.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Changes the caching policy. Caches are dropped either way.
    pub fn set_mutable(&mut self, mutable: bool) {
        self.mutable = mutable;
        self.refresh();
    }

    /// Mutates the consensus fields and drops every cache.
    pub fn update<T>(&mut self, f: impl FnOnce(&mut HeaderFields) -> T) -> T {
        let out = f(&mut self.fields);
        self.refresh();
        out
    }

    pub fn set_nonce(&mut self, nonce: u32) {
        self.update(|fields| fields.nonce = nonce);
    }

    /// Drops the cached hash, hex hash and sizes.
    pub fn refresh(&mut self) {
        self.hash.take();
        self.hash_hex.take();
        self.clear_sizes();
        trace!("header caches cleared");
    }

    /// Drops only the block size caches, keeping the hash.
    pub fn clear_sizes(&mut self) {
        self.size.take();
        self.witness_size.take();
    }

    fn compute_hash(&self) -> BlockHash {
        BlockHash::from_raw_hash(hash256(&self.encode()))
    }

    /// Double SHA-256 of the canonical encoding.
    ///
    /// Memoized while the header is immutable; recomputed on every call otherwise.
    pub fn hash(&self) -> BlockHash {
        if self.mutable {
            return self.compute_hash();
        }
        *self.hash.get_or_init(|| {
            let hash = self.compute_hash();
            trace!(%hash, "cached header hash");
            hash
        })
    }

    /// Lowercase hex of [`BlockHeader::hash`] in internal byte order.
    ///
    /// The cached string is always derived from the cached raw hash.
    pub fn hash_hex(&self) -> String {
        if self.mutable {
            return hex::encode(self.compute_hash().as_byte_array());
        }
        self.hash_hex
            .get_or_init(|| hex::encode(self.hash().as_byte_array()))
            .clone()
    }

    /// The identity hash in display byte order.
    pub fn reverse_hash(&self) -> String {
        self.hash().to_string()
    }

    /// scrypt proof-of-work hash of the canonical encoding. Never cached.
    pub fn pow_hash(&self) -> PowHash {
        scrypt_pow(&self.encode())
    }

    /// Proof-of-work hash with an explicitly chosen digest.
    pub fn pow_hash_with(&self, algorithm: PowAlgorithm) -> PowHash {
        algorithm.digest(&self.encode())
    }

    /// Checks the scrypt hash against `bits`.
    pub fn verify_pow(&self) -> bool {
        let pow_hash = self.pow_hash();
        let valid = verify_pow(&pow_hash, self.fields.bits);
        if !valid {
            debug!(
                hash = %self.hash(),
                %pow_hash,
                bits = format_args!("{:#010x}", self.fields.bits.to_consensus()),
                "proof of work failed"
            );
        }
        valid
    }

    /// Checks proof-of-work with the network's digest and PoW limit.
    pub fn verify_pow_for(&self, params: &Params) -> bool {
        let pow_hash = self.pow_hash_with(params.pow_algorithm);
        let valid = verify_pow_with_limit(&pow_hash, self.fields.bits, params.pow_limit);
        if !valid {
            debug!(
                network = %params.network,
                hash = %self.hash(),
                %pow_hash,
                bits = format_args!("{:#010x}", self.fields.bits.to_consensus()),
                "proof of work failed"
            );
        }
        valid
    }

    /// The `(block, hash)` inventory item announcing this header's block.
    pub fn to_inventory(&self) -> Inventory {
        Inventory::Block(self.hash())
    }

    /// Base serialized size of the owning block, memoized while immutable.
    pub fn cached_size(&self, compute: impl FnOnce() -> usize) -> usize {
        if self.mutable {
            return compute();
        }
        *self.size.get_or_init(compute)
    }

    /// Total serialized size of the owning block, memoized while immutable.
    pub fn cached_witness_size(&self, compute: impl FnOnce() -> usize) -> usize {
        if self.mutable {
            return compute();
        }
        *self.witness_size.get_or_init(compute)
    }

    #[cfg(test)]
    pub(crate) fn has_cached_hash(&self) -> bool {
        self.hash.get().is_some() || self.hash_hex.get().is_some()
    }

    #[cfg(test)]
    pub(crate) fn has_cached_size(&self) -> bool {
        self.size.get().is_some() || self.witness_size.get().is_some()
    }
}

impl Clone for BlockHeader {
    fn clone(&self) -> Self {
        BlockHeader {
            fields: self.fields,
            mutable: self.mutable,
            hash: self.hash.clone(),
            hash_hex: self.hash_hex.clone(),
            size: OnceLock::new(),
            witness_size: OnceLock::new(),
        }
    }
}

impl From<HeaderFields> for BlockHeader {
    fn from(fields: HeaderFields) -> Self {
        BlockHeader::new(fields)
    }
}

impl PartialEq for BlockHeader {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for BlockHeader {}

impl fmt::Debug for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockHeader")
            .field("fields", &self.fields)
            .field("mutable", &self.mutable)
            .finish_non_exhaustive()
    }
}

impl Encodable for BlockHeader {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        self.write_header(writer)
    }
}

impl Decodable for BlockHeader {
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, EncodeDecodeError> {
        HeaderFields::consensus_decode_from_finite_reader(reader).map(BlockHeader::new)
    }
}
