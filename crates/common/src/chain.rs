/// Block data structures: headers, block variants and transactions.
pub mod blockdata;
/// Consensus encoding, proof-of-work rules and chain parameters.
pub mod consensus;
/// Hash functions and hash types.
pub mod hashes;
/// Inventory items announced and requested over the peer protocol.
pub mod inventory;
/// Network types and constants.
pub mod network;
/// Proof of Work targets and work.
pub mod pow;
/// Various utility functions and types.
pub mod util;

/// I/O traits used by the consensus codec.
pub mod io {
    pub use bitcoin::io::{Error, ErrorKind, Read, Write};
}
