//! Header-only blocks, as carried by `headers` messages.

use super::{BlockHeader, BlockVariant, BodyError};
use crate::chain::{
    consensus::{Decodable, Encodable, EncodeDecodeError, VarInt},
    io::{Error as IoError, Read, Write},
};

/// A header announced without its body.
///
/// Encodes as the 80-byte header followed by a zero transaction count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadersBlock {
    header: BlockHeader,
}

impl HeadersBlock {
    pub fn new(header: BlockHeader) -> Self {
        HeadersBlock { header }
    }

    pub fn into_header(self) -> BlockHeader {
        self.header
    }
}

impl From<BlockHeader> for HeadersBlock {
    fn from(header: BlockHeader) -> Self {
        HeadersBlock::new(header)
    }
}

impl BlockVariant for HeadersBlock {
    fn header(&self) -> &BlockHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut BlockHeader {
        &mut self.header
    }

    /// There is no body to check.
    fn verify_body(&self) -> Result<(), BodyError> {
        Ok(())
    }
}

impl Encodable for HeadersBlock {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        let len = self.header.consensus_encode(writer)?;
        Ok(len.saturating_add(VarInt(0).consensus_encode(writer)?))
    }
}

impl Decodable for HeadersBlock {
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, EncodeDecodeError> {
        let header = BlockHeader::consensus_decode_from_finite_reader(reader)?;
        // The count is always zero on the wire and carries no information.
        let _count = VarInt::consensus_decode_from_finite_reader(reader)?;
        Ok(HeadersBlock::new(header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{
        blockdata::{block::HEADER_SIZE, genesis::GenesisInfo},
        consensus::{deserialize, serialize},
    };

    #[test]
    fn test_headers_block_encoding() -> Result<(), Box<dyn std::error::Error>> {
        let header = GenesisInfo::MAINNET.to_header();
        let block = HeadersBlock::new(header.clone());

        let bytes = serialize(&block);
        assert_eq!(bytes.len(), HEADER_SIZE + 1);
        assert_eq!(bytes[..HEADER_SIZE], header.encode()[..]);
        assert_eq!(bytes[HEADER_SIZE], 0);

        let decoded: HeadersBlock = deserialize(&bytes)?;
        assert_eq!(decoded, block);
        Ok(())
    }

    #[test]
    fn test_headers_block_verify() {
        let block = HeadersBlock::from(GenesisInfo::MAINNET.to_header());
        assert!(block.verify());
        assert_eq!(block.to_headers(), block);
        assert_eq!(block.into_header(), GenesisInfo::MAINNET.to_header());
    }
}
