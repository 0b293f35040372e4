//! Filtered blocks: a header plus a partial merkle tree proving which
//! transactions matched a peer's filter.

use bitcoin::{Txid, merkle_tree::PartialMerkleTree};

use super::{Block, BlockHeader, BlockVariant, BodyError, TxMerkleNode};
use crate::chain::{
    consensus::{Decodable, Encodable, EncodeDecodeError},
    inventory::Inventory,
    io::{Error as IoError, Read, Write},
};

const INVALID_PROOF_SCORE: u32 = 100;

/// A block header with a merkle proof for a subset of its transactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleBlock {
    header: BlockHeader,
    txn: PartialMerkleTree,
}

impl MerkleBlock {
    pub fn new(header: BlockHeader, txn: PartialMerkleTree) -> Self {
        MerkleBlock { header, txn }
    }

    /// Builds a proof for the transactions of `block` selected by `matches`.
    pub fn from_block(block: &Block, mut matches: impl FnMut(&Txid) -> bool) -> Self {
        let txids: Vec<Txid> = block.transactions().iter().map(|tx| tx.txid()).collect();
        let flags: Vec<bool> = txids.iter().map(&mut matches).collect();
        MerkleBlock {
            header: block.header().clone(),
            txn: PartialMerkleTree::from_txids(&txids, &flags),
        }
    }

    pub fn txn(&self) -> &PartialMerkleTree {
        &self.txn
    }

    /// Walks the proof, returning its root and the matched txids.
    pub fn extract_matches(&self) -> Result<(TxMerkleNode, Vec<Txid>), BodyError> {
        let mut matches = Vec::new();
        let mut indexes = Vec::new();
        let root = self
            .txn
            .extract_matches(&mut matches, &mut indexes)
            .map_err(|_| BodyError::new("bad-merkle-proof", INVALID_PROOF_SCORE))?;
        Ok((root, matches))
    }
}

impl BlockVariant for MerkleBlock {
    fn header(&self) -> &BlockHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut BlockHeader {
        &mut self.header
    }

    fn verify_body(&self) -> Result<(), BodyError> {
        let (root, _) = self.extract_matches()?;
        if root != self.header.merkle_root() {
            return Err(BodyError::new("bad-txnmrklroot", INVALID_PROOF_SCORE));
        }
        Ok(())
    }

    fn to_inventory(&self) -> Inventory {
        Inventory::FilteredBlock(self.header.hash())
    }
}

impl Encodable for MerkleBlock {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        let len = self.header.consensus_encode(writer)?;
        Ok(len.saturating_add(self.txn.consensus_encode(writer)?))
    }
}

impl Decodable for MerkleBlock {
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, EncodeDecodeError> {
        Ok(MerkleBlock {
            header: BlockHeader::consensus_decode_from_finite_reader(reader)?,
            txn: PartialMerkleTree::consensus_decode_from_finite_reader(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{
        blockdata::block::test_utils::mined_block,
        consensus::{deserialize, serialize},
    };

    #[test]
    fn test_merkle_block_from_block() {
        let block = mined_block();
        let wanted = block.transactions()[1].txid();
        let merkle = MerkleBlock::from_block(&block, |txid| *txid == wanted);

        let (root, matches) = merkle.extract_matches().unwrap();
        assert_eq!(root, block.header().merkle_root());
        assert_eq!(matches, vec![wanted]);
        assert!(merkle.verify());
        assert_eq!(merkle.to_inventory(), Inventory::FilteredBlock(block.hash()));
    }

    #[test]
    fn test_merkle_block_wrong_root() {
        let block = mined_block();
        let mut merkle = MerkleBlock::from_block(&block, |_| true);
        let wrong_root = TxMerkleNode::from_raw_hash(block.hash().to_raw_hash());
        merkle.header_mut().update(|fields| fields.merkle_root = wrong_root);
        assert_eq!(merkle.verify_body().unwrap_err().reason(), "bad-txnmrklroot");
    }

    #[test]
    fn test_merkle_block_malformed_proof() -> Result<(), Box<dyn std::error::Error>> {
        let block = mined_block();
        // Zero transactions, no hashes, no flag bytes.
        let empty: PartialMerkleTree = deserialize(&[0u8; 6])?;
        let merkle = MerkleBlock::new(block.header().clone(), empty);
        assert_eq!(merkle.verify_body().unwrap_err().reason(), "bad-merkle-proof");
        assert!(!merkle.verify());
        Ok(())
    }

    #[test]
    fn test_merkle_block_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let block = mined_block();
        let wanted = block.transactions()[2].txid();
        let merkle = MerkleBlock::from_block(&block, |txid| *txid == wanted);
        let bytes = serialize(&merkle);

        // Flag bits are padded to whole bytes on the wire, so compare what
        // the proof commits to rather than the tree itself.
        let decoded: MerkleBlock = deserialize(&bytes)?;
        assert_eq!(serialize(&decoded), bytes);
        assert_eq!(decoded.header(), merkle.header());
        assert_eq!(decoded.extract_matches()?, merkle.extract_matches()?);
        assert!(decoded.verify());
        Ok(())
    }
}
