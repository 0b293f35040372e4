//! Block variants and the verification dispatch they share.
//!
//! Every variant embeds a [`BlockHeader`] and supplies its own body check.
//! [`BlockVariant::check`] runs the cheap, self-contained proof-of-work check
//! first and only then asks the variant to verify its body.

mod header;
mod headers;
mod merkle;

use std::collections::HashSet;

pub use bitcoin::{BlockHash, TxMerkleNode};
pub use header::{BlockHeader, DisplayHeader, HEADER_SIZE, HeaderError, HeaderFields, HeaderOptions};
pub use headers::HeadersBlock;
pub use merkle::MerkleBlock;
use thiserror::Error;
use tracing::debug;

use crate::chain::{
    blockdata::transaction::Transaction,
    consensus::{Decodable, Encodable, EncodeDecodeError, VarInt},
    inventory::Inventory,
    io::{Error as IoError, Read, Write},
};

/// Maximum base size of a block in bytes.
pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// Ban score for a body that breaks a consensus rule.
const INVALID_BODY_SCORE: u32 = 100;

/// Ban score for a header whose proof-of-work is insufficient.
const HIGH_HASH_SCORE: u32 = 50;

/// A block body rejected by its variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (score {score})")]
pub struct BodyError {
    reason: &'static str,
    score: u32,
}

impl BodyError {
    pub const fn new(reason: &'static str, score: u32) -> Self {
        BodyError { reason, score }
    }

    /// Short reject reason, e.g. `bad-txnmrklroot`.
    pub fn reason(&self) -> &'static str {
        self.reason
    }

    /// Misbehavior score to charge the peer that sent the block.
    pub fn score(&self) -> u32 {
        self.score
    }

    fn invalid(reason: &'static str) -> Self {
        BodyError::new(reason, INVALID_BODY_SCORE)
    }
}

/// Why a block failed [`BlockVariant::check`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The proof-of-work hash is above the target, or `bits` is invalid.
    #[error("high-hash (score 50)")]
    HighHash,
    /// The variant rejected its body.
    #[error(transparent)]
    Body(#[from] BodyError),
}

impl VerifyError {
    pub fn reason(&self) -> &'static str {
        match self {
            VerifyError::HighHash => "high-hash",
            VerifyError::Body(err) => err.reason(),
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            VerifyError::HighHash => HIGH_HASH_SCORE,
            VerifyError::Body(err) => err.score(),
        }
    }
}

/// A concrete block representation built around a [`BlockHeader`].
///
/// Implementors supply access to their header and a body check; everything
/// else has a default in terms of those.
pub trait BlockVariant {
    /// The embedded header.
    fn header(&self) -> &BlockHeader;

    /// Mutable access to the embedded header.
    fn header_mut(&mut self) -> &mut BlockHeader;

    /// Checks the variant-specific body.
    fn verify_body(&self) -> Result<(), BodyError>;

    /// Drops caches held by the body. Called by a deep [`BlockVariant::refresh`].
    fn refresh_body(&mut self) {}

    /// The inventory item announcing this block.
    fn to_inventory(&self) -> Inventory {
        self.header().to_inventory()
    }

    /// The identity hash of the header.
    fn hash(&self) -> BlockHash {
        self.header().hash()
    }

    fn verify_pow(&self) -> bool {
        self.header().verify_pow()
    }

    /// Checks proof-of-work, then the body.
    ///
    /// The body is never inspected when proof-of-work fails.
    fn check(&self) -> Result<(), VerifyError> {
        if !self.verify_pow() {
            return Err(VerifyError::HighHash);
        }
        self.verify_body().map_err(|err| {
            debug!(
                hash = %self.hash(),
                reason = err.reason(),
                score = err.score(),
                "block body rejected"
            );
            VerifyError::Body(err)
        })
    }

    /// Returns `true` if [`BlockVariant::check`] passes.
    fn verify(&self) -> bool {
        self.check().is_ok()
    }

    /// Drops the header caches, and with `deep` the body's caches too.
    fn refresh(&mut self, deep: bool) {
        self.header_mut().refresh();
        if deep {
            self.refresh_body();
        }
    }

    /// A header-only copy of this block.
    fn to_headers(&self) -> HeadersBlock {
        HeadersBlock::new(self.header().clone())
    }
}

/// A full block: header plus transactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    header: BlockHeader,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Pairs `header` with `transactions`, dropping any size memo the header
    /// carried from another body.
    pub fn new(mut header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        header.clear_sizes();
        Block {
            header,
            transactions,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Mutable access to the transactions. Drops the block size caches.
    pub fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        self.header.clear_sizes();
        &mut self.transactions
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions_mut().push(tx);
    }

    /// Splits the block. The returned header no longer carries its size memo.
    pub fn into_parts(mut self) -> (BlockHeader, Vec<Transaction>) {
        self.header.clear_sizes();
        (self.header, self.transactions)
    }

    /// Merkle root of the transaction ids, or `None` for an empty block.
    pub fn compute_merkle_root(&self) -> Option<TxMerkleNode> {
        let hashes = self.transactions.iter().map(|tx| tx.txid().to_raw_hash());
        bitcoin::merkle_tree::calculate_root(hashes).map(TxMerkleNode::from_raw_hash)
    }

    /// Commits the current transactions in the header.
    ///
    /// Returns `false` and leaves the header alone if there are no transactions.
    pub fn update_merkle_root(&mut self) -> bool {
        match self.compute_merkle_root() {
            Some(root) => {
                self.header.update(|fields| fields.merkle_root = root);
                true
            }
            None => false,
        }
    }

    /// Serialized size without witness data, cached by the header.
    pub fn base_size(&self) -> usize {
        self.header.cached_size(|| {
            self.transactions
                .iter()
                .fold(self.framing_size(), |size, tx| size.saturating_add(tx.base_size()))
        })
    }

    /// Serialized size with witness data, cached by the header.
    pub fn total_size(&self) -> usize {
        self.header.cached_witness_size(|| {
            self.transactions
                .iter()
                .fold(self.framing_size(), |size, tx| size.saturating_add(tx.total_size()))
        })
    }

    fn framing_size(&self) -> usize {
        HEADER_SIZE.saturating_add(compact_size_len(self.transactions.len()))
    }
}

/// Length of the compact-size prefix encoding `n`.
fn compact_size_len(n: usize) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffff_ffff => 5,
        _ => 9,
    }
}

impl BlockVariant for Block {
    fn header(&self) -> &BlockHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut BlockHeader {
        &mut self.header
    }

    fn verify_body(&self) -> Result<(), BodyError> {
        if self.transactions.is_empty() || self.base_size() > MAX_BLOCK_SIZE {
            return Err(BodyError::invalid("bad-blk-length"));
        }

        if !self.transactions.first().is_some_and(Transaction::is_coinbase) {
            return Err(BodyError::invalid("bad-cb-missing"));
        }

        if self.compute_merkle_root() != Some(self.header.merkle_root()) {
            return Err(BodyError::invalid("bad-txnmrklroot"));
        }

        if self.transactions.iter().skip(1).any(Transaction::is_coinbase) {
            return Err(BodyError::invalid("bad-cb-multiple"));
        }

        let mut seen = HashSet::with_capacity(self.transactions.len());
        for tx in &self.transactions {
            if !seen.insert(tx.txid()) {
                return Err(BodyError::invalid("bad-txns-duplicate"));
            }
        }

        Ok(())
    }

    fn refresh_body(&mut self) {
        for tx in &mut self.transactions {
            tx.refresh();
        }
    }
}

impl Encodable for Block {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        let mut len = self.header.consensus_encode(writer)?;
        len = len.saturating_add(VarInt(self.transactions.len() as u64).consensus_encode(writer)?);
        for tx in &self.transactions {
            len = len.saturating_add(tx.consensus_encode(writer)?);
        }
        Ok(len)
    }
}

impl Decodable for Block {
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, EncodeDecodeError> {
        let header = BlockHeader::consensus_decode_from_finite_reader(reader)?;
        let VarInt(count) = VarInt::consensus_decode_from_finite_reader(reader)?;
        let mut transactions = Vec::new();
        for _ in 0..count {
            transactions.push(Transaction::consensus_decode_from_finite_reader(reader)?);
        }
        Ok(Block::new(header, transactions))
    }
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::{test_utils::*, *};
    use crate::chain::{
        blockdata::{genesis::GenesisInfo, transaction::test_utils::*},
        consensus::{deserialize, serialize},
        pow::CompactTarget,
    };

    /// Records whether its body check ran.
    struct RecordingBlock {
        header: BlockHeader,
        body_calls: Cell<u32>,
        body_ok: bool,
    }

    impl RecordingBlock {
        fn new(header: BlockHeader, body_ok: bool) -> Self {
            RecordingBlock {
                header,
                body_calls: Cell::new(0),
                body_ok,
            }
        }
    }

    impl BlockVariant for RecordingBlock {
        fn header(&self) -> &BlockHeader {
            &self.header
        }

        fn header_mut(&mut self) -> &mut BlockHeader {
            &mut self.header
        }

        fn verify_body(&self) -> Result<(), BodyError> {
            self.body_calls.set(self.body_calls.get() + 1);
            if self.body_ok {
                Ok(())
            } else {
                Err(BodyError::new("bad-test-body", 10))
            }
        }
    }

    fn failing_pow_header() -> BlockHeader {
        // A zero target can never be met.
        BlockHeader::new(HeaderFields {
            bits: CompactTarget::from_consensus(0),
            ..*GenesisInfo::MAINNET.to_header().fields()
        })
    }

    #[test]
    fn test_pow_failure_skips_body() {
        let block = RecordingBlock::new(failing_pow_header(), true);
        assert_eq!(block.check(), Err(VerifyError::HighHash));
        assert!(!block.verify());
        assert_eq!(block.body_calls.get(), 0);
    }

    #[test]
    fn test_body_checked_after_pow() {
        let block = RecordingBlock::new(GenesisInfo::MAINNET.to_header(), false);
        let err = block.check().unwrap_err();
        assert_eq!(err.reason(), "bad-test-body");
        assert_eq!(err.score(), 10);
        assert_eq!(block.body_calls.get(), 1);

        let block = RecordingBlock::new(GenesisInfo::MAINNET.to_header(), true);
        assert!(block.verify());
        assert_eq!(block.body_calls.get(), 1);
    }

    #[test]
    fn test_high_hash_reason() {
        assert_eq!(VerifyError::HighHash.reason(), "high-hash");
        assert_eq!(VerifyError::HighHash.score(), 50);
    }

    #[test]
    fn test_mined_block_verifies() {
        let block = mined_block();
        assert_eq!(block.check(), Ok(()));
        assert_eq!(block.to_inventory(), Inventory::Block(block.hash()));
    }

    #[test]
    fn test_bad_merkle_root() {
        let mut block = mined_block();
        block.add_transaction(spend(4, 0));
        assert_eq!(block.verify_body().unwrap_err().reason(), "bad-txnmrklroot");
    }

    #[test]
    fn test_coinbase_rules() {
        let mut block = Block::new(
            BlockHeader::new(regtest_fields()),
            vec![spend(1, 0), spend(2, 0)],
        );
        block.update_merkle_root();
        assert_eq!(block.verify_body().unwrap_err().reason(), "bad-cb-missing");

        let mut block = Block::new(
            BlockHeader::new(regtest_fields()),
            vec![coinbase(1, 50), coinbase(2, 50)],
        );
        block.update_merkle_root();
        assert_eq!(block.verify_body().unwrap_err().reason(), "bad-cb-multiple");
    }

    #[test]
    fn test_duplicate_transactions() {
        let mut block = Block::new(
            BlockHeader::new(regtest_fields()),
            vec![coinbase(1, 50), spend(2, 0), spend(2, 0)],
        );
        block.update_merkle_root();
        let err = block.verify_body().unwrap_err();
        assert_eq!(err.reason(), "bad-txns-duplicate");
        assert_eq!(err.score(), 100);
    }

    #[test]
    fn test_empty_block() {
        let mut block = Block::new(BlockHeader::new(regtest_fields()), Vec::new());
        assert!(!block.update_merkle_root());
        assert_eq!(block.verify_body().unwrap_err().reason(), "bad-blk-length");
    }

    #[test]
    fn test_sizes_are_cached_and_refreshed() {
        let mut block = mined_block();
        let size = block.base_size();
        assert_eq!(size, serialize(&block).len());
        assert_eq!(block.total_size(), size);

        block.add_transaction(spend(9, 0));
        assert_eq!(block.base_size(), serialize(&block).len());
        assert!(block.base_size() > size);
    }

    #[test]
    fn test_reused_header_reports_new_size() {
        let block = mined_block();
        let full_size = block.base_size();

        let (header, _) = block.into_parts();
        let empty = Block::new(header, Vec::new());
        assert_eq!(empty.base_size(), serialize(&empty).len());
        assert_eq!(empty.base_size(), HEADER_SIZE + 1);
        assert!(empty.base_size() < full_size);
        assert_eq!(empty.verify_body().unwrap_err().reason(), "bad-blk-length");

        let block = mined_block();
        let _ = block.total_size();
        assert!(!block.to_headers().header().has_cached_size());
        let merkle = MerkleBlock::from_block(&block, |_| true);
        assert!(!merkle.header().has_cached_size());
    }

    #[test]
    fn test_deep_refresh_reaches_transactions() {
        let mut block = mined_block();
        let _hash = block.hash();
        assert!(block.transactions().iter().all(Transaction::has_cached_txid));

        block.refresh(false);
        assert!(!block.header().has_cached_hash());
        assert!(block.transactions().iter().all(Transaction::has_cached_txid));

        block.refresh(true);
        assert!(!block.transactions().iter().any(Transaction::has_cached_txid));
    }

    #[test]
    fn test_block_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let block = mined_block();
        let bytes = serialize(&block);
        let decoded: Block = deserialize(&bytes)?;
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
        assert!(decoded.verify());
        Ok(())
    }

    #[test]
    fn test_to_headers() {
        let block = mined_block();
        let headers = block.to_headers();
        assert_eq!(headers.hash(), block.hash());
        assert!(headers.verify());
    }

    #[test]
    fn test_compact_size_len() {
        assert_eq!(compact_size_len(0), 1);
        assert_eq!(compact_size_len(0xfc), 1);
        assert_eq!(compact_size_len(0xfd), 3);
        assert_eq!(compact_size_len(0x10000), 5);
    }
}
