//! Ledger state queries
//!
//! The output index answers "what can this account spend" over an immutable
//! chain snapshot.

pub mod utxo_set;

pub use utxo_set::{OutputIndex, SpendPolicy, UTXOSet};
