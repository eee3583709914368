use crate::core::{Block, Income, Outcome, Transaction};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How `is_unspent` decides that an income has already been consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpendPolicy {
    /// Any income anywhere in the chain naming the same transaction hash marks
    /// every output of that transaction as spent, whatever its number.
    #[default]
    TransactionHash,
    /// Only an income naming the same (hash, number) pair marks it spent.
    Output,
}

impl SpendPolicy {
    /// What two incomes must share to consume the same output under this policy.
    pub fn spend_key(self, income: &Income) -> (&str, Option<u32>) {
        match self {
            SpendPolicy::TransactionHash => (income.get_prev_transaction_hash(), None),
            SpendPolicy::Output => (
                income.get_prev_transaction_hash(),
                Some(income.get_prev_output_number()),
            ),
        }
    }
}

impl FromStr for SpendPolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "transaction-hash" => Ok(SpendPolicy::TransactionHash),
            "output" => Ok(SpendPolicy::Output),
            _ => Err(LedgerError::Config(format!(
                "Invalid spend policy: {s}. Valid options: transaction-hash, output"
            ))),
        }
    }
}

impl fmt::Display for SpendPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpendPolicy::TransactionHash => write!(f, "transaction-hash"),
            SpendPolicy::Output => write!(f, "output"),
        }
    }
}

/// Read-only queries over ledger outputs.
///
/// Callers only see this trait, so a chain scan can later be swapped for an
/// incrementally maintained index without touching them.
pub trait OutputIndex {
    /// ( K -> transaction hash, V -> outcomes owned by `account` not yet consumed )
    fn unspent_outputs_for(&self, account: &str) -> BTreeMap<String, Vec<Outcome>>;

    /// First outcome in chain order with this transaction hash and number.
    fn outcome_by_hash_and_number(&self, hash: &str, number: u32) -> Result<Outcome>;

    fn is_unspent(&self, income: &Income) -> bool;

    /// Outputs `account` can actually spend under `is_unspent`, ordered by
    /// ascending transaction hash, then ascending outcome number.
    fn spendable_outputs_for(&self, account: &str) -> Vec<(String, Outcome)> {
        let mut spendable = vec![];
        for (transaction_hash, mut outcomes) in self.unspent_outputs_for(account) {
            outcomes.sort_by_key(|outcome| outcome.get_number());
            for outcome in outcomes {
                let income = Income::new(transaction_hash.clone(), outcome.get_number());
                if self.is_unspent(&income) {
                    spendable.push((transaction_hash.clone(), outcome));
                }
            }
        }
        spendable
    }

    fn balance_of(&self, account: &str) -> u128 {
        self.spendable_outputs_for(account)
            .iter()
            .map(|(_, outcome)| u128::from(outcome.get_value()))
            .sum()
    }
}

/// Output index answered by scanning every block of a chain snapshot.
pub struct UTXOSet<'a> {
    blocks: &'a [Block],
    policy: SpendPolicy,
}

impl<'a> UTXOSet<'a> {
    pub fn new(blocks: &'a [Block], policy: SpendPolicy) -> UTXOSet<'a> {
        UTXOSet { blocks, policy }
    }

    pub fn get_policy(&self) -> SpendPolicy {
        self.policy
    }

    fn transactions(&self) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.blocks
            .iter()
            .flat_map(|block| block.get_transactions().iter())
    }

    fn incomes(&self) -> impl Iterator<Item = &'a Income> + 'a {
        self.transactions()
            .flat_map(|transaction| transaction.get_incomes().iter())
    }
}

impl OutputIndex for UTXOSet<'_> {
    fn unspent_outputs_for(&self, account: &str) -> BTreeMap<String, Vec<Outcome>> {
        let mut outs: BTreeMap<String, Vec<Outcome>> = BTreeMap::new();

        for transaction in self.transactions() {
            let owned: Vec<Outcome> = transaction
                .get_outcomes()
                .iter()
                .filter(|outcome| outcome.get_target() == account)
                .cloned()
                .collect();
            outs.insert(transaction.get_hash().to_string(), owned);
        }

        for income in self.incomes() {
            if let Some(owned) = outs.get_mut(income.get_prev_transaction_hash()) {
                owned.retain(|outcome| outcome.get_number() != income.get_prev_output_number());
            }
        }

        outs.retain(|_, owned| !owned.is_empty());
        outs
    }

    fn outcome_by_hash_and_number(&self, hash: &str, number: u32) -> Result<Outcome> {
        self.transactions()
            .filter(|transaction| transaction.get_hash() == hash)
            .flat_map(|transaction| transaction.get_outcomes().iter())
            .find(|outcome| outcome.get_number() == number)
            .cloned()
            .ok_or_else(|| LedgerError::PrevOutputNotFound {
                transaction_hash: hash.to_string(),
                output_number: number,
            })
    }

    fn is_unspent(&self, income: &Income) -> bool {
        let key = self.policy.spend_key(income);
        !self
            .incomes()
            .any(|spent| self.policy.spend_key(spent) == key)
    }
}
