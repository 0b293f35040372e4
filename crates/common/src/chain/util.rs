use bitcoin::{BlockHash, Txid};
use hex::FromHex;

use crate::chain::hashes::Hash;

/// Decode a 32-byte hash from hex written in display (reversed) byte order,
/// returning the bytes in internal order.
pub fn display_hex_to_bytes(hex: &str) -> Result<[u8; 32], hex::FromHexError> {
    let mut bytes = <[u8; 32]>::from_hex(hex)?;
    bytes.reverse();
    Ok(bytes)
}

/// Hex-encode 32 hash bytes in display (reversed) byte order.
pub fn bytes_to_display_hex(bytes: &[u8; 32]) -> String {
    let mut reversed = *bytes;
    reversed.reverse();
    hex::encode(reversed)
}

/// Convert an internal-order hex string to a Txid.
pub fn hex_to_txid(hex: &str) -> Result<Txid, hex::FromHexError> {
    let bytes = <[u8; 32]>::from_hex(hex)?;
    Ok(Txid::from_byte_array(bytes))
}

/// Convert an internal-order hex string to a BlockHash.
pub fn hex_to_blockhash(hex: &str) -> Result<BlockHash, hex::FromHexError> {
    let bytes = <[u8; 32]>::from_hex(hex)?;
    Ok(BlockHash::from_byte_array(bytes))
}
