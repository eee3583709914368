// Transactions move value between named accounts using the UTXO model.
// Each transaction consumes earlier outcomes through its incomes and creates new outcomes.

use crate::error::{LedgerError, Result};
use crate::storage::OutputIndex;
use crate::utils::{current_timestamp, hash_record};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reference to one earlier outcome, by transaction hash and outcome number
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Income {
    prev_transaction_hash: String,
    prev_output_number: u32,
}

impl Income {
    pub fn new(prev_transaction_hash: impl Into<String>, prev_output_number: u32) -> Income {
        Income {
            prev_transaction_hash: prev_transaction_hash.into(),
            prev_output_number,
        }
    }

    pub fn get_prev_transaction_hash(&self) -> &str {
        self.prev_transaction_hash.as_str()
    }

    pub fn get_prev_output_number(&self) -> u32 {
        self.prev_output_number
    }
}

/// Value paid to `target`; `number` is the position inside the owning transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outcome {
    number: u32,
    value: u64,
    target: String,
}

impl Outcome {
    pub fn new(number: u32, value: u64, target: impl Into<String>) -> Outcome {
        Outcome {
            number,
            value,
            target: target.into(),
        }
    }

    pub fn get_number(&self) -> u32 {
        self.number
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_target(&self) -> &str {
        self.target.as_str()
    }
}

// Missing JSON fields decode to their zero value so that `{}` reaches validation
// and is rejected as a structural error instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transaction {
    timestamp: i64,
    hash: String,
    incomes: Vec<Income>,
    outcomes: Vec<Outcome>,
    from: String,
    to: String,
}

/// Fields covered by the transaction hash, in digest order
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionHashInput<'a> {
    timestamp: i64,
    incomes: &'a [Income],
    outcomes: &'a [Outcome],
    from: &'a str,
    to: &'a str,
}

impl Transaction {
    /// Build a transaction with the hash it carries, exactly as an external
    /// submitter sent it. Nothing is checked here.
    pub fn from_parts(
        timestamp: i64,
        hash: impl Into<String>,
        incomes: Vec<Income>,
        outcomes: Vec<Outcome>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Transaction {
        Transaction {
            timestamp,
            hash: hash.into(),
            incomes,
            outcomes,
            from: from.into(),
            to: to.into(),
        }
    }

    /// Build a transaction and stamp it with its own hash.
    pub fn sealed(
        timestamp: i64,
        incomes: Vec<Income>,
        outcomes: Vec<Outcome>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Transaction> {
        let mut tx = Transaction::from_parts(timestamp, "", incomes, outcomes, from, to);
        tx.hash = tx.calculate_hash()?;
        Ok(tx)
    }

    /// Construct a transfer of `value` from `from` to `to` by coin selection.
    ///
    /// Spendable outputs are consumed in ascending transaction hash order, then
    /// ascending outcome number, until their sum covers `value`. Outcome #0 pays
    /// `to`; any surplus returns to `from` as outcome #1. Identical ledger state
    /// always selects the same incomes; only the timestamp varies between calls.
    ///
    /// Only outputs that pass `is_unspent` are candidates. Under the coarse
    /// policy this can report `InsufficientFunds` where a plain scan of
    /// `unspent_outputs_for` would have built a transaction that fails
    /// validation.
    pub fn new_transaction(
        value: u64,
        from: &str,
        to: &str,
        index: &impl OutputIndex,
    ) -> Result<Transaction> {
        if value == 0 {
            return Err(LedgerError::Structural(
                "transfer value must be positive".to_string(),
            ));
        }
        if from.is_empty() || to.is_empty() {
            return Err(LedgerError::Structural(
                "sender and recipient are required".to_string(),
            ));
        }

        let mut accumulated: u128 = 0;
        let mut incomes = vec![];
        for (transaction_hash, outcome) in index.spendable_outputs_for(from) {
            if accumulated >= u128::from(value) {
                break;
            }
            accumulated += u128::from(outcome.get_value());
            incomes.push(Income::new(transaction_hash, outcome.get_number()));
        }

        if accumulated < u128::from(value) {
            return Err(LedgerError::InsufficientFunds {
                required: value,
                available: accumulated as u64,
            });
        }

        let mut outcomes = vec![Outcome::new(0, value, to)];
        // Bounded by the last selected output, so the change always fits in u64
        let change = (accumulated - u128::from(value)) as u64;
        if change > 0 {
            outcomes.push(Outcome::new(1, change, from));
        }

        Transaction::sealed(current_timestamp()?, incomes, outcomes, from, to)
    }

    pub fn calculate_hash(&self) -> Result<String> {
        hash_record(&TransactionHashInput {
            timestamp: self.timestamp,
            incomes: &self.incomes,
            outcomes: &self.outcomes,
            from: &self.from,
            to: &self.to,
        })
    }

    /// Check this transaction against the ledger state behind `index`.
    ///
    /// Checks run in a fixed order and the first failure is returned: structure,
    /// then each income in order (exists, unspent, owned by the sender), then
    /// conservation of value, then the hash.
    pub fn validate(&self, index: &impl OutputIndex) -> Result<()> {
        self.check_structure()?;

        let mut consumed = HashSet::new();
        let mut sum_in: u128 = 0;
        for income in &self.incomes {
            let prev_outcome = index.outcome_by_hash_and_number(
                income.get_prev_transaction_hash(),
                income.get_prev_output_number(),
            )?;

            // A repeated income inside one transaction would count its value twice
            if !index.is_unspent(income) || !consumed.insert(income) {
                return Err(LedgerError::IncomeAlreadySpent {
                    transaction_hash: income.prev_transaction_hash.clone(),
                    output_number: income.prev_output_number,
                });
            }

            if prev_outcome.get_target() != self.from {
                return Err(LedgerError::PrevOutputTargetMismatch {
                    expected: self.from.clone(),
                    actual: prev_outcome.target,
                });
            }

            sum_in += u128::from(prev_outcome.value);
        }

        let sum_out = self.get_output_value();
        if sum_in != sum_out {
            return Err(LedgerError::ValueMismatch {
                inputs: sum_in,
                outputs: sum_out,
            });
        }

        let calculated = self.calculate_hash()?;
        if calculated != self.hash {
            return Err(LedgerError::HashMismatch {
                subject: "transaction",
                expected: calculated,
                actual: self.hash.clone(),
            });
        }

        Ok(())
    }

    fn check_structure(&self) -> Result<()> {
        let missing = if self.timestamp <= 0 {
            Some("timestamp")
        } else if self.hash.is_empty() {
            Some("hash")
        } else if self.incomes.is_empty() {
            Some("incomes")
        } else if self.outcomes.is_empty() {
            Some("outcomes")
        } else if self.from.is_empty() {
            Some("from")
        } else if self.to.is_empty() {
            Some("to")
        } else if self
            .incomes
            .iter()
            .any(|income| income.prev_transaction_hash.is_empty())
        {
            Some("incomes.prevTransactionHash")
        } else if self.outcomes.iter().any(|outcome| outcome.target.is_empty()) {
            Some("outcomes.target")
        } else {
            None
        };

        if let Some(field) = missing {
            return Err(LedgerError::Structural(format!(
                "required field `{field}` is missing"
            )));
        }

        if self.outcomes.iter().any(|outcome| outcome.value == 0) {
            return Err(LedgerError::Structural(
                "outcome values must be positive".to_string(),
            ));
        }

        // Outcomes are addressed by number, so each number must be unique
        for (position, outcome) in self.outcomes.iter().enumerate() {
            if u32::try_from(position).ok() != Some(outcome.number) {
                return Err(LedgerError::Structural(format!(
                    "outcome at position {position} is numbered {}",
                    outcome.number
                )));
            }
        }

        Ok(())
    }

    pub fn get_output_value(&self) -> u128 {
        self.outcomes
            .iter()
            .map(|outcome| u128::from(outcome.value))
            .sum()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_incomes(&self) -> &[Income] {
        self.incomes.as_slice()
    }

    pub fn get_outcomes(&self) -> &[Outcome] {
        self.outcomes.as_slice()
    }

    pub fn get_from(&self) -> &str {
        self.from.as_str()
    }

    pub fn get_to(&self) -> &str {
        self.to.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::genesis::{seed_chain, GENESIS_TRANSACTION_HASH};
    use crate::storage::{SpendPolicy, UTXOSet};
    use crate::testnet::{seed_transfer_hash, transfer};

    #[test]
    fn test_empty_transaction_is_structural_error() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let tx: Transaction = serde_json::from_str("{}").unwrap();
        let err = tx.validate(&index).unwrap_err();
        assert!(matches!(err, LedgerError::Structural(_)));
    }

    #[test]
    fn test_zero_value_outcome_is_structural_error() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let tx = transfer(
            &seed_transfer_hash(&chain),
            1,
            vec![Outcome::new(0, 30, "dsxack"), Outcome::new(1, 0, "lilit")],
        );
        assert!(matches!(
            tx.validate(&index),
            Err(LedgerError::Structural(_))
        ));
    }

    #[test]
    fn test_outcome_numbers_must_follow_position() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::Output);
        let seed = seed_transfer_hash(&chain);

        let duplicated = transfer(
            &seed,
            1,
            vec![Outcome::new(0, 10, "carol"), Outcome::new(0, 20, "carol")],
        );
        assert!(matches!(
            duplicated.validate(&index),
            Err(LedgerError::Structural(_))
        ));

        let reordered = transfer(
            &seed,
            1,
            vec![Outcome::new(1, 10, "carol"), Outcome::new(0, 20, "carol")],
        );
        assert!(matches!(
            reordered.validate(&index),
            Err(LedgerError::Structural(_))
        ));

        let skipped = transfer(&seed, 1, vec![Outcome::new(3, 30, "carol")]);
        assert!(matches!(
            skipped.validate(&index),
            Err(LedgerError::Structural(_))
        ));

        let sequential = transfer(
            &seed,
            1,
            vec![Outcome::new(0, 10, "carol"), Outcome::new(1, 20, "carol")],
        );
        assert_eq!(sequential.validate(&index), Ok(()));
    }

    #[test]
    fn test_spent_genesis_income_is_rejected() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let tx = transfer(GENESIS_TRANSACTION_HASH, 0, vec![Outcome::new(0, 10, "dsxack")]);
        let err = tx.validate(&index).unwrap_err();
        assert_eq!(
            err,
            LedgerError::IncomeAlreadySpent {
                transaction_hash: GENESIS_TRANSACTION_HASH.to_string(),
                output_number: 0,
            }
        );
    }

    #[test]
    fn test_missing_output_number_is_not_found() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let tx = transfer(GENESIS_TRANSACTION_HASH, 15, vec![Outcome::new(0, 10, "dsxack")]);
        assert!(matches!(
            tx.validate(&index),
            Err(LedgerError::PrevOutputNotFound { output_number: 15, .. })
        ));
    }

    #[test]
    fn test_foreign_output_is_target_mismatch() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        // Seed transfer outcome #0 belongs to dsxack, not lilit
        let tx = transfer(&seed_transfer_hash(&chain), 0, vec![Outcome::new(0, 120, "dsxack")]);
        let err = tx.validate(&index).unwrap_err();
        assert_eq!(
            err,
            LedgerError::PrevOutputTargetMismatch {
                expected: "lilit".to_string(),
                actual: "dsxack".to_string(),
            }
        );
    }

    #[test]
    fn test_unbalanced_outputs_are_value_mismatch() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let tx = transfer(
            &seed_transfer_hash(&chain),
            1,
            vec![Outcome::new(0, 20, "dsxack"), Outcome::new(1, 20, "lilit")],
        );
        assert_eq!(
            tx.validate(&index).unwrap_err(),
            LedgerError::ValueMismatch {
                inputs: 30,
                outputs: 40
            }
        );
    }

    #[test]
    fn test_tampered_hash_is_rejected() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let sealed = transfer(
            &seed_transfer_hash(&chain),
            1,
            vec![Outcome::new(0, 20, "dsxack"), Outcome::new(1, 10, "lilit")],
        );
        assert!(sealed.validate(&index).is_ok());

        let tampered = Transaction::from_parts(
            sealed.get_timestamp(),
            "1d718cc004415418ae64176751ac3aab7c085db0b9a43e17a0ab560a9297570b",
            sealed.get_incomes().to_vec(),
            sealed.get_outcomes().to_vec(),
            "lilit",
            "dsxack",
        );
        assert!(matches!(
            tampered.validate(&index),
            Err(LedgerError::HashMismatch { subject: "transaction", .. })
        ));
    }

    #[test]
    fn test_duplicate_income_is_rejected() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::Output);
        let seed = seed_transfer_hash(&chain);

        let tx = Transaction::sealed(
            1_700_000_000_000,
            vec![Income::new(seed.clone(), 1), Income::new(seed, 1)],
            vec![Outcome::new(0, 60, "dsxack")],
            "lilit",
            "dsxack",
        )
        .unwrap();
        assert!(matches!(
            tx.validate(&index),
            Err(LedgerError::IncomeAlreadySpent { output_number: 1, .. })
        ));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let tx = Transaction::new_transaction(25, "lilit", "dsxack", &index).unwrap();
        assert_eq!(tx.validate(&index), Ok(()));
        assert_eq!(tx.validate(&index), Ok(()));
    }

    #[test]
    fn test_new_transaction_emits_change() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let tx = Transaction::new_transaction(25, "lilit", "dsxack", &index).unwrap();
        assert_eq!(
            tx.get_incomes(),
            &[Income::new(seed_transfer_hash(&chain), 1)]
        );
        assert_eq!(
            tx.get_outcomes(),
            &[Outcome::new(0, 25, "dsxack"), Outcome::new(1, 5, "lilit")]
        );
        assert_eq!(tx.get_hash(), tx.calculate_hash().unwrap());
    }

    #[test]
    fn test_new_transaction_exact_amount_has_no_change() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let tx = Transaction::new_transaction(30, "lilit", "dsxack", &index).unwrap();
        assert_eq!(tx.get_outcomes(), &[Outcome::new(0, 30, "dsxack")]);
    }

    #[test]
    fn test_new_transaction_insufficient_funds() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        let err = Transaction::new_transaction(31, "lilit", "dsxack", &index).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                required: 31,
                available: 30
            }
        );
    }

    #[test]
    fn test_new_transaction_rejects_zero_value() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::TransactionHash);

        assert!(matches!(
            Transaction::new_transaction(0, "lilit", "dsxack", &index),
            Err(LedgerError::Structural(_))
        ));
    }

    #[test]
    fn test_coin_selection_respects_spend_policy() {
        let chain = seed_chain().unwrap();
        let seed = seed_transfer_hash(&chain);

        // Genesis #2 is untouched, but its transaction hash has been referenced
        let coarse = UTXOSet::new(&chain, SpendPolicy::TransactionHash);
        assert_eq!(
            Transaction::new_transaction(150, "dsxack", "lilit", &coarse).unwrap_err(),
            LedgerError::InsufficientFunds {
                required: 150,
                available: 120
            }
        );

        let per_output = UTXOSet::new(&chain, SpendPolicy::Output);
        let tx = Transaction::new_transaction(150, "dsxack", "lilit", &per_output).unwrap();
        // Hex digests sort before the literal genesis hash
        assert_eq!(
            tx.get_incomes(),
            &[
                Income::new(seed, 0),
                Income::new(GENESIS_TRANSACTION_HASH, 2)
            ]
        );
        assert_eq!(
            tx.get_outcomes(),
            &[Outcome::new(0, 150, "lilit"), Outcome::new(1, 40, "dsxack")]
        );
        assert_eq!(tx.validate(&per_output), Ok(()));
    }

    #[test]
    fn test_selection_order_is_reproducible() {
        let chain = seed_chain().unwrap();
        let index = UTXOSet::new(&chain, SpendPolicy::Output);

        let first = Transaction::new_transaction(150, "dsxack", "lilit", &index).unwrap();
        let second = Transaction::new_transaction(150, "dsxack", "lilit", &index).unwrap();
        assert_eq!(first.get_incomes(), second.get_incomes());
        assert_eq!(first.get_outcomes(), second.get_outcomes());
    }

    #[test]
    fn test_missing_json_fields_decode_to_defaults() {
        let tx: Transaction =
            serde_json::from_str(r#"{"from":"lilit","incomes":[{"prevTransactionHash":"x"}]}"#)
                .unwrap();
        assert_eq!(tx.get_from(), "lilit");
        assert_eq!(tx.get_incomes()[0].get_prev_output_number(), 0);
        assert!(tx.get_hash().is_empty());
    }
}
