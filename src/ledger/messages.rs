use crate::core::{Block, Transaction};
use crate::error::Result;
use crossbeam_channel::Sender;

/// Outcome of one submission: the appended block, or why it was refused
pub type SubmissionResult = Result<Block>;

/// Work item on the ledger actor's submission queue
pub(crate) enum Command {
    /// Validate `transaction` and append it in its own block. With a `reply`
    /// channel the result goes there only, otherwise to the shared stream.
    Submit {
        transaction: Transaction,
        reply: Option<Sender<SubmissionResult>>,
    },
    /// Candidate chain from outside this process
    ProposeChain {
        blocks: Vec<Block>,
        reply: Sender<Result<bool>>,
    },
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::Submit { .. } => "submit",
            Command::ProposeChain { .. } => "propose-chain",
        }
    }
}
