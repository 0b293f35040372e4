/// Block variants and the shared header core.
pub mod block;

/// Genesis block information for each network.
pub mod genesis;

/// Transactions carried by full blocks.
pub mod transaction;
