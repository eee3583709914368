//! Seed data for a fresh ledger
//!
//! One genesis root holding the initial allocation, followed by a single block
//! with the first transfer. The genesis block and its transaction carry fixed
//! literal hashes; everything after them is hashed normally.

use crate::core::{Block, Income, Outcome, Transaction};
use crate::error::Result;

pub const GENESIS_BLOCK_HASH: &str = "genesisBlockHash";
pub const GENESIS_TRANSACTION_HASH: &str = "genesisTransactionHash";

// 2018-02-10T00:00:00Z, so every node derives identical seed hashes
const SEED_TIMESTAMP: i64 = 1_518_220_800_000;

pub fn genesis_block() -> Block {
    let allocation = Transaction::from_parts(
        SEED_TIMESTAMP,
        GENESIS_TRANSACTION_HASH,
        vec![],
        vec![
            Outcome::new(0, 100, "lilit"),
            Outcome::new(1, 50, "lilit"),
            Outcome::new(2, 70, "dsxack"),
        ],
        "",
        "",
    );
    Block::from_parts(0, SEED_TIMESTAMP, GENESIS_BLOCK_HASH, "", vec![allocation])
}

/// Genesis plus the seed transfer of 120 from lilit to dsxack.
pub fn seed_chain() -> Result<Vec<Block>> {
    let genesis = genesis_block();

    let transfer = Transaction::sealed(
        SEED_TIMESTAMP,
        vec![
            Income::new(GENESIS_TRANSACTION_HASH, 0),
            Income::new(GENESIS_TRANSACTION_HASH, 1),
        ],
        vec![Outcome::new(0, 120, "dsxack"), Outcome::new(1, 30, "lilit")],
        "lilit",
        "dsxack",
    )?;

    let block = Block::sealed(1, SEED_TIMESTAMP, GENESIS_BLOCK_HASH, vec![transfer])?;

    Ok(vec![genesis, block])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Blockchain;
    use crate::storage::SpendPolicy;

    #[test]
    fn test_seed_chain_is_reproducible() {
        let first = seed_chain().unwrap();
        let second = seed_chain().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_seed_chain_has_single_root() {
        let chain = seed_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.iter().filter(|block| block.is_genesis()).count(), 1);
        assert_eq!(chain[1].get_prev_hash(), GENESIS_BLOCK_HASH);
    }

    #[test]
    fn test_seed_chain_passes_revalidation() {
        let chain = seed_chain().unwrap();
        assert!(Blockchain::validate_chain(&chain, SpendPolicy::TransactionHash).is_ok());
        assert!(Blockchain::validate_chain(&chain, SpendPolicy::Output).is_ok());
    }
}
