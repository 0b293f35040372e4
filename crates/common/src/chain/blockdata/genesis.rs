//! Genesis block information.

use bitcoin::{BlockHash, TxMerkleNode};

use crate::chain::{
    blockdata::block::{BlockHeader, HeaderFields},
    hashes::Hash,
    network::Network,
    pow::CompactTarget,
};

/// Merkle root of the genesis coinbase shared by every network, internal order.
const GENESIS_MERKLE_ROOT: [u8; 32] = [
    0xd9, 0xce, 0xd4, 0xed, 0x11, 0x30, 0xf7, 0xb7, 0xfa, 0xad, 0x9b, 0xe2, 0x53, 0x23, 0xff, 0xaf,
    0xa3, 0x32, 0x32, 0xa1, 0x7c, 0x3e, 0xdf, 0x6c, 0xfd, 0x97, 0xbe, 0xe6, 0xba, 0xfb, 0xdd, 0x97,
];

/// Header fields of a network's genesis block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisInfo {
    /// The version of the genesis block.
    pub version: u32,
    /// The merkle root of the genesis block, internal byte order.
    pub merkle_root: [u8; 32],
    /// The timestamp of the genesis block.
    pub time: u32,
    /// The bits (difficulty) of the genesis block.
    pub bits: CompactTarget,
    /// The nonce of the genesis block.
    pub nonce: u32,
}

impl GenesisInfo {
    /// Mainnet genesis.
    pub const MAINNET: Self = Self {
        version: 1,
        merkle_root: GENESIS_MERKLE_ROOT,
        time: 1317972665,
        bits: CompactTarget::from_consensus(0x1e0ffff0),
        nonce: 2084524493,
    };

    /// Testnet genesis.
    pub const TESTNET: Self = Self {
        version: 1,
        merkle_root: GENESIS_MERKLE_ROOT,
        time: 1486949366,
        bits: CompactTarget::from_consensus(0x1e0ffff0),
        nonce: 293345,
    };

    /// Regtest genesis.
    pub const REGTEST: Self = Self {
        version: 1,
        merkle_root: GENESIS_MERKLE_ROOT,
        time: 1296688602,
        bits: CompactTarget::from_consensus(0x207fffff),
        nonce: 0,
    };

    /// Returns the genesis block information for the specified network.
    pub fn for_network(network: Network) -> Self {
        network.consensus_params().genesis
    }

    /// The consensus fields of the genesis header.
    pub fn to_fields(&self) -> HeaderFields {
        HeaderFields {
            version: self.version,
            prev_block: BlockHash::all_zeros(),
            merkle_root: TxMerkleNode::from_byte_array(self.merkle_root),
            time: self.time,
            bits: self.bits,
            nonce: self.nonce,
        }
    }

    /// Builds the immutable genesis header.
    pub fn to_header(&self) -> BlockHeader {
        BlockHeader::new(self.to_fields())
    }
}
