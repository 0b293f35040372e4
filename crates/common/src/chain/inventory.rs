//! Inventory items: `(type, hash)` pairs used to announce or request objects.

use bitcoin::{BlockHash, Txid};

use crate::chain::{
    consensus::{Decodable, Encodable, EncodeDecodeError},
    hashes::Hash,
    io::{Error as IoError, Read, Write},
};

/// An inventory item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Inventory {
    /// The hash is a `Txid`.
    Transaction(Txid),
    /// The hash is a block header hash.
    Block(BlockHash),
    /// The hash is a block header hash. When used in a `getdata` message, the
    /// response is a `merkleblock` message rather than a `block` message.
    FilteredBlock(BlockHash),
    /// The hash is a block header hash. When used in a `getdata` message, the
    /// response is a `cmpctblock` message.
    CompactBlock(BlockHash),
    /// The hash is a `Txid`, requested with witness serialization.
    WitnessTransaction(Txid),
    /// The hash is a block header hash, requested with witness serialization.
    WitnessBlock(BlockHash),
    /// Reserved for future use.
    FilteredWitnessBlock(BlockHash),
    /// An inventory type this node does not know, kept for reporting.
    Unknown { inv_type: u32, hash: [u8; 32] },
}

impl Inventory {
    /// Wire type code of this item.
    pub fn inv_type(&self) -> u32 {
        match self {
            Inventory::Transaction(_) => 1,
            Inventory::Block(_) => 2,
            Inventory::FilteredBlock(_) => 3,
            Inventory::CompactBlock(_) => 4,
            Inventory::WitnessTransaction(_) => 0x40000001,
            Inventory::WitnessBlock(_) => 0x40000002,
            Inventory::FilteredWitnessBlock(_) => 0x40000003,
            Inventory::Unknown { inv_type, .. } => *inv_type,
        }
    }

    /// Raw hash bytes in internal order.
    pub fn hash_bytes(&self) -> &[u8; 32] {
        match self {
            Inventory::Transaction(hash) | Inventory::WitnessTransaction(hash) => {
                hash.as_byte_array()
            }
            Inventory::Block(hash)
            | Inventory::FilteredBlock(hash)
            | Inventory::CompactBlock(hash)
            | Inventory::WitnessBlock(hash)
            | Inventory::FilteredWitnessBlock(hash) => hash.as_byte_array(),
            Inventory::Unknown { hash, .. } => hash,
        }
    }

    /// Lowercase hex of the hash in internal byte order.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash_bytes())
    }

    /// Returns `true` if the item refers to a block in any form.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Inventory::Block(_)
                | Inventory::FilteredBlock(_)
                | Inventory::CompactBlock(_)
                | Inventory::WitnessBlock(_)
                | Inventory::FilteredWitnessBlock(_)
        )
    }

    /// The `(type, hash)` pair.
    pub fn as_parts(&self) -> (u32, &[u8; 32]) {
        (self.inv_type(), self.hash_bytes())
    }
}

impl Encodable for Inventory {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, IoError> {
        let (inv_type, hash) = self.as_parts();
        let mut len: usize = 0;
        len = len.saturating_add(inv_type.consensus_encode(w)?);
        len = len.saturating_add(hash.consensus_encode(w)?);
        Ok(len)
    }
}

impl Decodable for Inventory {
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(
        r: &mut R,
    ) -> Result<Self, EncodeDecodeError> {
        let inv_type: u32 = Decodable::consensus_decode_from_finite_reader(r)?;
        let hash: [u8; 32] = Decodable::consensus_decode_from_finite_reader(r)?;
        Ok(match inv_type {
            1 => Inventory::Transaction(Txid::from_byte_array(hash)),
            2 => Inventory::Block(BlockHash::from_byte_array(hash)),
            3 => Inventory::FilteredBlock(BlockHash::from_byte_array(hash)),
            4 => Inventory::CompactBlock(BlockHash::from_byte_array(hash)),
            0x40000001 => Inventory::WitnessTransaction(Txid::from_byte_array(hash)),
            0x40000002 => Inventory::WitnessBlock(BlockHash::from_byte_array(hash)),
            0x40000003 => Inventory::FilteredWitnessBlock(BlockHash::from_byte_array(hash)),
            _ => Inventory::Unknown { inv_type, hash },
        })
    }
}
