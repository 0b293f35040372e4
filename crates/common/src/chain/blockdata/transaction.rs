//! Transactions as carried inside a block.
//!
//! Script and input validation live elsewhere; a block only needs a
//! transaction's id, its coinbase status and its serialized sizes.

use std::sync::OnceLock;

use bitcoin::Txid;
use tracing::trace;

use crate::chain::{
    consensus::{Decodable, Encodable, EncodeDecodeError},
    io::{Error as IoError, Read, Write},
};

/// A transaction with a lazily computed, refreshable txid.
#[derive(Debug, Clone)]
pub struct Transaction {
    inner: bitcoin::Transaction,
    txid: OnceLock<Txid>,
}

impl Transaction {
    /// Wraps a decoded transaction.
    pub fn new(inner: bitcoin::Transaction) -> Self {
        Transaction {
            inner,
            txid: OnceLock::new(),
        }
    }

    /// The wrapped transaction.
    pub fn inner(&self) -> &bitcoin::Transaction {
        &self.inner
    }

    /// Mutable access to the wrapped transaction.
    ///
    /// Clears the cached txid, since the caller may change any field.
    pub fn inner_mut(&mut self) -> &mut bitcoin::Transaction {
        self.refresh();
        &mut self.inner
    }

    /// Unwraps into the underlying transaction.
    pub fn into_inner(self) -> bitcoin::Transaction {
        self.inner
    }

    /// The transaction id, computed once and cached until [`Transaction::refresh`].
    pub fn txid(&self) -> Txid {
        *self.txid.get_or_init(|| {
            let txid = self.inner.compute_txid();
            trace!(%txid, "cached txid");
            txid
        })
    }

    /// Drops the cached txid.
    pub fn refresh(&mut self) {
        self.txid.take();
    }

    /// Returns `true` if the transaction spends the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inner.is_coinbase()
    }

    /// Serialized size without witness data.
    pub fn base_size(&self) -> usize {
        self.inner.base_size()
    }

    /// Serialized size including witness data.
    pub fn total_size(&self) -> usize {
        self.inner.total_size()
    }

    #[cfg(test)]
    pub(crate) fn has_cached_txid(&self) -> bool {
        self.txid.get().is_some()
    }
}

impl From<bitcoin::Transaction> for Transaction {
    fn from(inner: bitcoin::Transaction) -> Self {
        Transaction::new(inner)
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Transaction {}

impl Encodable for Transaction {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, IoError> {
        self.inner.consensus_encode(writer)
    }
}

impl Decodable for Transaction {
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, EncodeDecodeError> {
        bitcoin::Transaction::consensus_decode_from_finite_reader(reader).map(Transaction::new)
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use bitcoin::{
        Amount, OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Witness, absolute::LockTime,
        transaction::Version,
    };

    use super::Transaction;
    use crate::chain::hashes::Hash;

    /// A coinbase paying `value` satoshis, tagged so distinct tags give distinct txids.
    pub(crate) fn coinbase(tag: u8, value: u64) -> Transaction {
        bitcoin::Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::from_bytes(vec![0x01, tag]),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(value),
                script_pubkey: ScriptBuf::new(),
            }],
        }
        .into()
    }

    /// A transaction spending output `vout` of a fake previous transaction.
    pub(crate) fn spend(tag: u8, vout: u32) -> Transaction {
        bitcoin::Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::new(bitcoin::Txid::from_byte_array([tag; 32]), vout),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(1_000),
                script_pubkey: ScriptBuf::new(),
            }],
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::{test_utils::*, *};
    use crate::chain::consensus::{deserialize, serialize};

    #[test]
    fn test_txid_cached_until_refresh() {
        let mut tx = spend(7, 0);
        assert!(!tx.has_cached_txid());
        let before = tx.txid();
        assert!(tx.has_cached_txid());

        tx.inner_mut().output[0].value = bitcoin::Amount::from_sat(2_000);
        assert!(!tx.has_cached_txid());
        assert_ne!(tx.txid(), before);

        tx.refresh();
        assert!(!tx.has_cached_txid());
    }

    #[test]
    fn test_coinbase_detection() {
        assert!(coinbase(1, 50).is_coinbase());
        assert!(!spend(1, 0).is_coinbase());
    }

    #[test]
    fn test_consensus_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let tx = spend(3, 1);
        let bytes = serialize(&tx);
        assert_eq!(bytes.len(), tx.base_size());
        assert_eq!(tx.base_size(), tx.total_size());

        let decoded: Transaction = deserialize(&bytes)?;
        assert_eq!(decoded, tx);
        assert_eq!(decoded.txid(), tx.txid());
        Ok(())
    }
}
