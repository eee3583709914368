use crate::core::{Block, Chain, ChainReader, Transaction};
use crate::error::{LedgerError, Result};
use crate::ledger::messages::{Command, SubmissionResult};
use crate::storage::{OutputIndex, SpendPolicy, UTXOSet};
use crossbeam_channel::{bounded, Sender};

/// Cloneable front door to a running ledger.
///
/// Submissions block while the queue is full. Reads never touch the queue:
/// they clone the latest published snapshot.
#[derive(Clone)]
pub struct LedgerHandle {
    commands: Sender<Command>,
    chain: ChainReader,
    policy: SpendPolicy,
}

impl LedgerHandle {
    pub(crate) fn new(commands: Sender<Command>, chain: ChainReader, policy: SpendPolicy) -> Self {
        LedgerHandle {
            commands,
            chain,
            policy,
        }
    }

    /// Enqueue `transaction`; its result is posted on the shared results stream.
    ///
    /// That stream is unbounded and is not drained for you, so callers that
    /// never read `Ledger::results` should use `submit_and_wait` instead.
    pub fn submit(&self, transaction: Transaction) -> Result<()> {
        self.send(Command::Submit {
            transaction,
            reply: None,
        })
    }

    /// Enqueue `transaction` and wait for its own result.
    pub fn submit_and_wait(&self, transaction: Transaction) -> SubmissionResult {
        let (reply, response) = bounded(1);
        self.send(Command::Submit {
            transaction,
            reply: Some(reply),
        })?;
        response.recv().map_err(|_| LedgerError::LedgerStopped)?
    }

    /// Offer a chain received from elsewhere. It is fully revalidated by the
    /// actor before the longest chain rule applies.
    pub fn propose_chain(&self, blocks: Vec<Block>) -> Result<bool> {
        let (reply, response) = bounded(1);
        self.send(Command::ProposeChain { blocks, reply })?;
        response.recv().map_err(|_| LedgerError::LedgerStopped)?
    }

    pub fn current_chain(&self) -> Chain {
        self.chain.current_chain()
    }

    pub fn get_policy(&self) -> SpendPolicy {
        self.policy
    }

    /// Build a transfer by coin selection over the current snapshot. The actor
    /// validates it again when it is submitted.
    pub fn new_transaction(&self, value: u64, from: &str, to: &str) -> Result<Transaction> {
        let chain = self.current_chain();
        let utxo_set = UTXOSet::new(&chain, self.policy);
        Transaction::new_transaction(value, from, to, &utxo_set)
    }

    pub fn balance_of(&self, account: &str) -> u128 {
        let chain = self.current_chain();
        UTXOSet::new(&chain, self.policy).balance_of(account)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| LedgerError::LedgerStopped)
    }
}
