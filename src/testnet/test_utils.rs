//! Test utilities for ledger testing

use crate::core::{Block, Blockchain, Income, Outcome, Transaction};
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::storage::SpendPolicy;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Fixed timestamp for hand-built transactions, so their hashes are stable
pub const TEST_TIMESTAMP: i64 = 1_700_000_000_000;

/// Create a temporary directory for testing
pub fn create_temp_dir() -> Result<TempDir> {
    tempfile::tempdir().map_err(|e| LedgerError::Io(e.to_string()))
}

/// Write `contents` to a config file inside a fresh temporary directory
pub fn create_temp_config(contents: &str) -> Result<(TempDir, PathBuf)> {
    let temp_dir = create_temp_dir()?;
    let path = temp_dir.path().join("ledger.toml");
    fs::write(&path, contents)?;
    Ok((temp_dir, path))
}

/// Create a ledger holding only the seed chain
pub fn seeded_blockchain(policy: SpendPolicy) -> Blockchain {
    Blockchain::seeded(policy).unwrap()
}

/// Start a ledger actor over the seed chain
pub fn spawn_test_ledger(policy: SpendPolicy, queue_capacity: usize) -> Ledger {
    Ledger::spawn(seeded_blockchain(policy), queue_capacity).unwrap()
}

/// Hash of the seed transfer in block 1
pub fn seed_transfer_hash(chain: &[Block]) -> String {
    chain[1].get_transactions()[0].get_hash().to_string()
}

/// A sealed lilit -> dsxack transaction spending one earlier output
pub fn transfer(prev_hash: &str, number: u32, outcomes: Vec<Outcome>) -> Transaction {
    Transaction::sealed(
        TEST_TIMESTAMP,
        vec![Income::new(prev_hash, number)],
        outcomes,
        "lilit",
        "dsxack",
    )
    .unwrap()
}

/// Copy of `chain` with one more block carrying `transaction`
pub fn extend(chain: &[Block], transaction: Transaction) -> Vec<Block> {
    let tip = &chain[chain.len() - 1];
    let block = Block::generate_block(tip, transaction).unwrap();
    let mut extended = chain.to_vec();
    extended.push(block);
    extended
}

/// Check linkage and hashes of every block after genesis
pub fn validate_chain_integrity(chain: &[Block]) -> bool {
    chain
        .windows(2)
        .all(|pair| pair[1].validate(&pair[0]).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::seed_chain;

    #[test]
    fn test_seeded_blockchain() {
        let blockchain = seeded_blockchain(SpendPolicy::TransactionHash);
        assert_eq!(blockchain.len(), 2);
        assert!(validate_chain_integrity(blockchain.get_blocks()));
    }

    #[test]
    fn test_extend_keeps_integrity() {
        let chain = seed_chain().unwrap();
        let tx = transfer(
            &seed_transfer_hash(&chain),
            1,
            vec![Outcome::new(0, 30, "dsxack")],
        );
        let extended = extend(&chain, tx);
        assert_eq!(extended.len(), 3);
        assert!(validate_chain_integrity(&extended));
    }

    #[test]
    fn test_create_temp_config() {
        let (_temp_dir, path) = create_temp_config("queue_capacity = 3\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "queue_capacity = 3\n");
    }
}
