//! # UTXO Ledger
//!
//! An append-only, hash-linked ledger of value transfers between named
//! accounts, using the unspent-output model.
//!
//! ## How the code is organized
//! - `core/`: transactions and coin selection, blocks, the seed chain, and the
//!   chain owner that validates candidates and publishes snapshots
//! - `storage/`: read-only output queries over a chain snapshot
//! - `ledger/`: the actor that serializes every write through a bounded queue
//! - `network/`: JSON-over-TCP request layer and client helper
//! - `config/`: settings layering and the process-wide `GLOBAL_CONFIG`
//! - `utils/`: hashing and timestamps
//! - `cli/`: command-line parsing for the `utxo-ledger` binary
//!
//! ## Where to start reading
//! 1. `core/transaction.rs` for validation order and coin selection
//! 2. `storage/utxo_set.rs` for how spent outputs are detected
//! 3. `ledger/actor.rs` for the single-writer loop
//! 4. `core/blockchain.rs` for chain replacement and revalidation

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod ledger;
pub mod network;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, Settings, GLOBAL_CONFIG};
pub use core::{
    Block, Blockchain, Chain, ChainReader, Income, Outcome, Transaction, GENESIS_BLOCK_HASH,
    GENESIS_TRANSACTION_HASH,
};
pub use error::{ErrorKind, LedgerError, Result};
pub use ledger::{Ledger, LedgerHandle, SubmissionResult};
pub use network::{send_request, Request, Response, Server};
pub use storage::{OutputIndex, SpendPolicy, UTXOSet};
pub use utils::{current_timestamp, hash_record, sha256_digest};
