use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::utils::{current_timestamp, hash_record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    index: u64,
    timestamp: i64,
    hash: String,
    prev_hash: String,
    transactions: Vec<Transaction>,
}

/// Fields covered by the block hash, in digest order
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockHashInput<'a> {
    index: u64,
    timestamp: i64,
    prev_hash: &'a str,
    transactions: &'a [Transaction],
}

impl Block {
    /// Wrap `transaction` in a block linked to `prev_block`. No validation here.
    pub fn generate_block(prev_block: &Block, transaction: Transaction) -> Result<Block> {
        Block::sealed(
            prev_block.index + 1,
            current_timestamp()?,
            prev_block.hash.clone(),
            vec![transaction],
        )
    }

    /// Build a block and stamp it with its own hash.
    pub fn sealed(
        index: u64,
        timestamp: i64,
        prev_hash: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Result<Block> {
        let mut block = Block::from_parts(index, timestamp, "", prev_hash, transactions);
        block.hash = block.calculate_hash()?;
        Ok(block)
    }

    /// Reassemble a block exactly as it was received, hash included.
    pub fn from_parts(
        index: u64,
        timestamp: i64,
        hash: impl Into<String>,
        prev_hash: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Block {
        Block {
            index,
            timestamp,
            hash: hash.into(),
            prev_hash: prev_hash.into(),
            transactions,
        }
    }

    pub fn calculate_hash(&self) -> Result<String> {
        hash_record(&BlockHashInput {
            index: self.index,
            timestamp: self.timestamp,
            prev_hash: &self.prev_hash,
            transactions: &self.transactions,
        })
    }

    /// Check that this block extends `prev_block` and that its hash is intact.
    pub fn validate(&self, prev_block: &Block) -> Result<()> {
        if self.index != prev_block.index + 1 {
            return Err(LedgerError::IndexMismatch {
                expected: prev_block.index + 1,
                actual: self.index,
            });
        }

        if self.prev_hash != prev_block.hash {
            return Err(LedgerError::PrevHashMismatch {
                expected: prev_block.hash.clone(),
                actual: self.prev_hash.clone(),
            });
        }

        let calculated = self.calculate_hash()?;
        if calculated != self.hash {
            return Err(LedgerError::HashMismatch {
                subject: "block",
                expected: calculated,
                actual: self.hash.clone(),
            });
        }

        Ok(())
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_prev_hash(&self) -> &str {
        self.prev_hash.as_str()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::genesis::seed_chain;
    use crate::core::Outcome;
    use crate::testnet::{seed_transfer_hash, transfer};

    fn next_block() -> (Block, Block) {
        let chain = seed_chain().unwrap();
        let tip = chain.last().unwrap().clone();
        let tx = transfer(
            &seed_transfer_hash(&chain),
            1,
            vec![Outcome::new(0, 30, "dsxack")],
        );
        let block = Block::generate_block(&tip, tx).unwrap();
        (tip, block)
    }

    #[test]
    fn test_generated_block_links_to_predecessor() {
        let (tip, block) = next_block();
        assert_eq!(block.get_index(), tip.get_index() + 1);
        assert_eq!(block.get_prev_hash(), tip.get_hash());
        assert_eq!(block.get_transactions().len(), 1);
        assert_eq!(block.get_hash(), block.calculate_hash().unwrap());
        assert_eq!(block.validate(&tip), Ok(()));
    }

    #[test]
    fn test_wrong_index_is_rejected() {
        let (tip, block) = next_block();
        let skipped = Block::from_parts(
            block.get_index() + 1,
            block.get_timestamp(),
            block.get_hash(),
            block.get_prev_hash(),
            block.get_transactions().to_vec(),
        );
        assert_eq!(
            skipped.validate(&tip),
            Err(LedgerError::IndexMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_wrong_prev_hash_is_rejected() {
        let (tip, block) = next_block();
        let orphan = Block::from_parts(
            block.get_index(),
            block.get_timestamp(),
            block.get_hash(),
            "wrong_previous_hash",
            block.get_transactions().to_vec(),
        );
        assert!(matches!(
            orphan.validate(&tip),
            Err(LedgerError::PrevHashMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_contents_change_hash() {
        let (tip, block) = next_block();
        let tampered = Block::from_parts(
            block.get_index(),
            block.get_timestamp() + 1,
            block.get_hash(),
            block.get_prev_hash(),
            block.get_transactions().to_vec(),
        );
        assert!(matches!(
            tampered.validate(&tip),
            Err(LedgerError::HashMismatch { subject: "block", .. })
        ));
    }

    #[test]
    fn test_block_json_uses_camel_case() {
        let (_, block) = next_block();
        let json = serde_json::to_value(&block).unwrap();
        assert!(json.get("prevHash").is_some());
        assert!(json["transactions"][0]["incomes"][0]
            .get("prevTransactionHash")
            .is_some());
    }
}
