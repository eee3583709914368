//! Testnet helpers for ledger testing
//!
//! Seeded chains, hand-built transfers and temporary config files shared by the
//! unit tests of every module.

pub mod test_utils;

pub use test_utils::*;
