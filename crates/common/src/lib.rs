//! Block header core for scrypt proof-of-work chains.
//!
//! This library holds the representation every block passes through before
//! full validation: the 80-byte header, its identity hash, the memory-hard
//! proof-of-work hash, and the dispatch that checks proof-of-work first and
//! the variant-specific body second.

#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::indexing_slicing))]
#![cfg_attr(test, allow(clippy::panic))]

/// Types and functions for scrypt chains.
pub mod chain;
