//! Structured and display (JSON) forms of a header.
//!
//! Structured data carries hashes in internal byte order. Display data
//! carries them reversed, the way explorers and RPC print them. These are the
//! only two places the byte order of hash fields is chosen.

use bitcoin::{BlockHash, TxMerkleNode};
use hex::FromHex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{BlockHeader, HeaderError, HeaderFields};
use crate::chain::{
    hashes::Hash,
    pow::CompactTarget,
    util::{bytes_to_display_hex, display_hex_to_bytes},
};

/// Options for building a header from internal-order data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderOptions {
    fields: HeaderFields,
    mutable: bool,
}

impl HeaderOptions {
    /// Immutable header options for `fields`.
    pub fn new(fields: HeaderFields) -> Self {
        HeaderOptions {
            fields,
            mutable: false,
        }
    }

    /// Sets the caching policy of the header being built.
    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    /// Parses options from a JSON object with internal-order hash strings.
    ///
    /// `version`, `time` (or `timestamp`), `bits` and `nonce` must be unsigned
    /// 32-bit numbers, `prevBlock` and `merkleRoot` 64-character hex strings.
    /// An optional `mutable` must be a boolean.
    pub fn from_value(value: &Value) -> Result<Self, HeaderError> {
        let object = object(value)?;
        let fields = read_fields(object, HashOrder::Internal)?;
        let mutable = match object.get("mutable") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(mutable)) => *mutable,
            Some(_) => {
                return Err(HeaderError::TypeMismatch {
                    field: "mutable",
                    expected: "a boolean",
                });
            }
        };
        Ok(HeaderOptions { fields, mutable })
    }

    pub(super) fn into_parts(self) -> (HeaderFields, bool) {
        (self.fields, self.mutable)
    }
}

impl From<HeaderFields> for HeaderOptions {
    fn from(fields: HeaderFields) -> Self {
        HeaderOptions::new(fields)
    }
}

/// JSON display form of a header; hashes are in display byte order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayHeader {
    /// Identity hash, present when produced by [`BlockHeader::to_display`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub version: u32,
    pub prev_block: String,
    pub merkle_root: String,
    #[serde(alias = "timestamp")]
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl TryFrom<DisplayHeader> for BlockHeader {
    type Error = HeaderError;

    fn try_from(display: DisplayHeader) -> Result<Self, Self::Error> {
        let prev_block = parse_hash(&display.prev_block, "prevBlock", HashOrder::Display)?;
        let merkle_root = parse_hash(&display.merkle_root, "merkleRoot", HashOrder::Display)?;
        Ok(BlockHeader::new(HeaderFields {
            version: display.version,
            prev_block: BlockHash::from_byte_array(prev_block),
            merkle_root: TxMerkleNode::from_byte_array(merkle_root),
            time: display.time,
            bits: CompactTarget::from_consensus(display.bits),
            nonce: display.nonce,
        }))
    }
}

impl BlockHeader {
    /// Builds an immutable header from display JSON, reversing both hash fields.
    ///
    /// Applies the same presence and type checks as [`HeaderOptions::from_value`].
    pub fn from_display(value: &Value) -> Result<Self, HeaderError> {
        let fields = read_fields(object(value)?, HashOrder::Display)?;
        Ok(BlockHeader::new(fields))
    }

    /// The display form, including the identity hash.
    pub fn to_display(&self) -> DisplayHeader {
        DisplayHeader {
            hash: Some(self.reverse_hash()),
            version: self.fields.version,
            prev_block: bytes_to_display_hex(self.fields.prev_block.as_byte_array()),
            merkle_root: bytes_to_display_hex(self.fields.merkle_root.as_byte_array()),
            time: self.fields.time,
            bits: self.fields.bits.to_consensus(),
            nonce: self.fields.nonce,
        }
    }
}

#[derive(Clone, Copy)]
enum HashOrder {
    Internal,
    Display,
}

fn object(value: &Value) -> Result<&Map<String, Value>, HeaderError> {
    match value {
        Value::Null => Err(HeaderError::InvalidData("header data is missing")),
        Value::Object(object) => Ok(object),
        _ => Err(HeaderError::InvalidData("header data must be an object")),
    }
}

fn read_fields(object: &Map<String, Value>, order: HashOrder) -> Result<HeaderFields, HeaderError> {
    let time = match object.get("time") {
        None | Some(Value::Null) => u32_field(object, "timestamp")?,
        Some(_) => u32_field(object, "time")?,
    };
    Ok(HeaderFields {
        version: u32_field(object, "version")?,
        prev_block: BlockHash::from_byte_array(hash_field(object, "prevBlock", order)?),
        merkle_root: TxMerkleNode::from_byte_array(hash_field(object, "merkleRoot", order)?),
        time,
        bits: CompactTarget::from_consensus(u32_field(object, "bits")?),
        nonce: u32_field(object, "nonce")?,
    })
}

fn u32_field(object: &Map<String, Value>, field: &'static str) -> Result<u32, HeaderError> {
    object
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(HeaderError::TypeMismatch {
            field,
            expected: "an unsigned 32-bit number",
        })
}

fn hash_field(
    object: &Map<String, Value>,
    field: &'static str,
    order: HashOrder,
) -> Result<[u8; 32], HeaderError> {
    let hex = object
        .get(field)
        .and_then(Value::as_str)
        .ok_or(HeaderError::TypeMismatch {
            field,
            expected: "a hex string",
        })?;
    parse_hash(hex, field, order)
}

fn parse_hash(hex: &str, field: &'static str, order: HashOrder) -> Result<[u8; 32], HeaderError> {
    let parsed = match order {
        HashOrder::Internal => <[u8; 32]>::from_hex(hex),
        HashOrder::Display => display_hex_to_bytes(hex),
    };
    parsed.map_err(|_| HeaderError::TypeMismatch {
        field,
        expected: "a 32-byte hex string",
    })
}
