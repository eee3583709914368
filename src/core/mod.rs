//! Core ledger functionality
//!
//! This module contains the fundamental ledger components: transactions and
//! their coin selection, hash-linked blocks, the seed chain, and the chain
//! owner that validates and publishes snapshots.

pub mod block;
pub mod blockchain;
pub mod genesis;
pub mod transaction;

pub use block::Block;
pub use blockchain::{Blockchain, Chain, ChainReader};
pub use genesis::{genesis_block, seed_chain, GENESIS_BLOCK_HASH, GENESIS_TRANSACTION_HASH};
pub use transaction::{Income, Outcome, Transaction};
