// The chain of blocks owned by the ledger actor.
// Readers never touch it directly: every accepted change is published as a new
// immutable snapshot that readers clone out of a shared slot.

use crate::core::genesis::seed_chain;
use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::storage::{SpendPolicy, UTXOSet};
use log::info;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Immutable snapshot of the whole chain, genesis first
pub type Chain = Arc<Vec<Block>>;

/// Cheap, cloneable read access to the latest published chain
#[derive(Clone)]
pub struct ChainReader {
    published: Arc<RwLock<Chain>>,
}

impl ChainReader {
    /// The lock is only held long enough to clone the `Arc`, never while a
    /// block is being validated or built.
    pub fn current_chain(&self) -> Chain {
        Arc::clone(&self.published.read())
    }
}

pub struct Blockchain {
    blocks: Chain,
    published: Arc<RwLock<Chain>>,
    policy: SpendPolicy,
}

impl Blockchain {
    /// Adopt `blocks` as the active chain after validating them in full.
    pub fn new(blocks: Vec<Block>, policy: SpendPolicy) -> Result<Blockchain> {
        Self::validate_chain(&blocks, policy)?;
        let blocks = Arc::new(blocks);
        Ok(Blockchain {
            published: Arc::new(RwLock::new(Arc::clone(&blocks))),
            blocks,
            policy,
        })
    }

    /// A fresh ledger holding the genesis allocation and the seed transfer.
    pub fn seeded(policy: SpendPolicy) -> Result<Blockchain> {
        Self::new(seed_chain()?, policy)
    }

    pub fn reader(&self) -> ChainReader {
        ChainReader {
            published: Arc::clone(&self.published),
        }
    }

    pub fn get_blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    /// Most recently appended block. A `Blockchain` is never empty.
    pub fn get_tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn get_genesis(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get_policy(&self) -> SpendPolicy {
        self.policy
    }

    pub fn utxo_set(&self) -> UTXOSet<'_> {
        UTXOSet::new(&self.blocks, self.policy)
    }

    /// Longest chain wins: `candidate` replaces the active chain only when it is
    /// strictly longer. Nothing inside `candidate` is checked here, so callers
    /// must have validated every block they added.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.blocks.len() {
            return false;
        }

        self.blocks = Arc::new(candidate);
        *self.published.write() = Arc::clone(&self.blocks);
        true
    }

    /// Replacement for chains from outside this process. The candidate must
    /// share our genesis block and pass full revalidation before the length
    /// rule is applied.
    pub fn replace_chain_untrusted(&mut self, candidate: Vec<Block>) -> Result<bool> {
        match candidate.first() {
            Some(genesis) if genesis == self.get_genesis() => {}
            _ => {
                return Err(LedgerError::InvalidChain(
                    "candidate does not share the active genesis block".to_string(),
                ))
            }
        }

        Self::validate_chain(&candidate, self.policy)?;

        let previous_len = self.blocks.len();
        let replaced = self.replace_chain(candidate);
        if replaced {
            info!(
                "Replaced chain of {} blocks with candidate of {} blocks",
                previous_len,
                self.blocks.len()
            );
        }
        Ok(replaced)
    }

    /// Check a whole chain block by block.
    ///
    /// The first block must be the only genesis root. Every later block must
    /// link to its predecessor, and each of its transactions must be valid
    /// against the chain prefix before it without spending an output twice
    /// inside the same block.
    pub fn validate_chain(blocks: &[Block], policy: SpendPolicy) -> Result<()> {
        let genesis = blocks
            .first()
            .ok_or_else(|| LedgerError::InvalidChain("chain is empty".to_string()))?;
        if !genesis.is_genesis() || !genesis.get_prev_hash().is_empty() {
            return Err(LedgerError::InvalidChain(
                "first block is not a genesis root".to_string(),
            ));
        }

        for (position, pair) in blocks.windows(2).enumerate() {
            let (prev_block, block) = (&pair[0], &pair[1]);
            if block.is_genesis() {
                return Err(LedgerError::InvalidChain(format!(
                    "duplicate genesis block at position {}",
                    position + 1
                )));
            }
            block.validate(prev_block)?;

            // Outputs consumed by earlier transactions of the same block, keyed
            // the way the policy decides spentness
            let utxo_set = UTXOSet::new(&blocks[..=position], policy);
            let mut consumed: HashSet<(&str, Option<u32>)> = HashSet::new();
            for transaction in block.get_transactions() {
                transaction.validate(&utxo_set)?;
                if let Some(income) = transaction
                    .get_incomes()
                    .iter()
                    .find(|&income| consumed.contains(&policy.spend_key(income)))
                {
                    return Err(LedgerError::IncomeAlreadySpent {
                        transaction_hash: income.get_prev_transaction_hash().to_string(),
                        output_number: income.get_prev_output_number(),
                    });
                }
                consumed.extend(
                    transaction
                        .get_incomes()
                        .iter()
                        .map(|income| policy.spend_key(income)),
                );
            }
        }

        Ok(())
    }
}
