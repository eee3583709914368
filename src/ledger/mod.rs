//! Ledger actor
//!
//! The only place the chain is mutated. Submissions enter a bounded FIFO queue
//! (senders block while it is full), a dedicated thread validates and appends
//! them one at a time, and every accepted block is published as a new
//! immutable chain snapshot that readers take without queueing.

pub mod actor;
pub mod handle;
pub mod messages;

pub use actor::Ledger;
pub use handle::LedgerHandle;
pub use messages::SubmissionResult;
