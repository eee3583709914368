use crate::core::{Block, Blockchain, Transaction};
use crate::error::{LedgerError, Result};
use crate::ledger::handle::LedgerHandle;
use crate::ledger::messages::{Command, SubmissionResult};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info, warn};
use std::thread::{self, JoinHandle};

/// Single writer of the chain. Drains the submission queue in arrival order
/// and runs each command to completion before taking the next one.
pub(crate) struct LedgerActor {
    blockchain: Blockchain,
    commands: Receiver<Command>,
    results: Sender<SubmissionResult>,
}

impl LedgerActor {
    /// Process commands until every sender is dropped. Returns an error only
    /// when a hash input could not be encoded.
    pub fn run(mut self) -> Result<()> {
        let tip = self.blockchain.get_tip();
        info!(
            "Ledger actor started at block {} ({}) with {} spend policy",
            tip.get_index(),
            tip.get_hash(),
            self.blockchain.get_policy()
        );

        while let Ok(command) = self.commands.recv() {
            debug!("Processing {} command", command.name());
            match command {
                Command::Submit { transaction, reply } => {
                    let result = self.handle_submission(transaction);
                    let fatal = Self::fatal_error(&result);
                    self.report(result, reply);
                    if let Some(err) = fatal {
                        error!("Stopping ledger actor: {err}");
                        return Err(err);
                    }
                }
                Command::ProposeChain { blocks, reply } => {
                    let result = self.handle_chain_proposal(blocks);
                    let fatal = Self::fatal_error(&result);
                    if reply.send(result).is_err() {
                        debug!("Chain proposal result dropped, requester went away");
                    }
                    if let Some(err) = fatal {
                        error!("Stopping ledger actor: {err}");
                        return Err(err);
                    }
                }
            }
        }

        info!(
            "Submission queue closed, ledger actor stopped at block {}",
            self.blockchain.get_tip().get_index()
        );
        Ok(())
    }

    fn handle_submission(&mut self, transaction: Transaction) -> SubmissionResult {
        let transaction_hash = transaction.get_hash().to_string();
        if let Err(err) = transaction.validate(&self.blockchain.utxo_set()) {
            warn!(
                "Rejected transaction {transaction_hash} ({}): {err}",
                err.kind()
            );
            return Err(err);
        }

        let tip = self.blockchain.get_tip();
        let block = Block::generate_block(tip, transaction)?;
        if let Err(err) = block.validate(tip) {
            warn!("Rejected block {} ({}): {err}", block.get_index(), err.kind());
            return Err(err);
        }

        let mut candidate = self.blockchain.get_blocks().to_vec();
        candidate.push(block.clone());
        if !self.blockchain.replace_chain(candidate) {
            return Err(LedgerError::InvalidChain(
                "extended chain was not longer than the active chain".to_string(),
            ));
        }

        info!(
            "Appended block {} ({}) carrying transaction {transaction_hash}",
            block.get_index(),
            block.get_hash()
        );
        Ok(block)
    }

    fn handle_chain_proposal(&mut self, blocks: Vec<Block>) -> Result<bool> {
        let candidate_len = blocks.len();
        match self.blockchain.replace_chain_untrusted(blocks) {
            Ok(true) => Ok(true),
            Ok(false) => {
                debug!(
                    "Kept active chain of {} blocks over candidate of {candidate_len}",
                    self.blockchain.len()
                );
                Ok(false)
            }
            Err(err) => {
                warn!("Rejected candidate chain ({}): {err}", err.kind());
                Err(err)
            }
        }
    }

    fn report(&self, result: SubmissionResult, reply: Option<Sender<SubmissionResult>>) {
        let delivered = match reply {
            Some(reply) => reply.send(result).is_ok(),
            None => self.results.send(result).is_ok(),
        };
        if !delivered {
            debug!("Submission result dropped, nobody is listening");
        }
    }

    fn fatal_error<T>(result: &Result<T>) -> Option<LedgerError> {
        match result {
            Err(err) if err.is_fatal() => Some(err.clone()),
            _ => None,
        }
    }
}

/// A running ledger: the actor thread, a handle to it and the shared results
/// stream for plain `submit` calls.
pub struct Ledger {
    handle: LedgerHandle,
    results: Receiver<SubmissionResult>,
    worker: JoinHandle<Result<()>>,
}

impl Ledger {
    /// Start the actor over `blockchain` with a submission queue holding at
    /// most `queue_capacity` pending commands.
    pub fn spawn(blockchain: Blockchain, queue_capacity: usize) -> Result<Ledger> {
        if queue_capacity == 0 {
            return Err(LedgerError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        let (commands_tx, commands_rx) = bounded(queue_capacity);
        let (results_tx, results_rx) = unbounded();
        let handle = LedgerHandle::new(commands_tx, blockchain.reader(), blockchain.get_policy());

        let actor = LedgerActor {
            blockchain,
            commands: commands_rx,
            results: results_tx,
        };
        let worker = thread::Builder::new()
            .name("ledger-actor".to_string())
            .spawn(move || actor.run())?;

        Ok(Ledger {
            handle,
            results: results_rx,
            worker,
        })
    }

    pub fn handle(&self) -> LedgerHandle {
        self.handle.clone()
    }

    /// Results of `submit` calls, one per submission, in submission order.
    ///
    /// Results stay queued here until someone receives them. The stream never
    /// blocks the actor, so a caller using `submit` must keep draining it.
    pub fn results(&self) -> &Receiver<SubmissionResult> {
        &self.results
    }

    /// Close our side of the queue and wait for the actor to finish. Commands
    /// already queued are still processed, and the actor only stops once every
    /// other handle clone has been dropped too.
    pub fn shutdown(self) -> Result<()> {
        let Ledger {
            handle,
            results,
            worker,
        } = self;
        drop(handle);

        let outcome = worker
            .join()
            .map_err(|_| LedgerError::Io("ledger actor thread panicked".to_string()))?;
        drop(results);
        outcome
    }
}
