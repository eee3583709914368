//! Error handling for the ledger
//!
//! Every validation failure is a value, never a panic. The ledger actor reports
//! these on the results stream and keeps running; only `Serialization` (a hash
//! input that could not be encoded) is treated as fatal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A required field is missing or empty
    Structural(String),
    /// The sender does not own enough unspent value
    InsufficientFunds { required: u64, available: u64 },
    /// An income references an output that does not exist
    PrevOutputNotFound {
        transaction_hash: String,
        output_number: u32,
    },
    /// An income references an output that has already been consumed
    IncomeAlreadySpent {
        transaction_hash: String,
        output_number: u32,
    },
    /// An income references an output owned by someone other than the sender
    PrevOutputTargetMismatch { expected: String, actual: String },
    /// Inputs and outputs do not balance
    ValueMismatch { inputs: u128, outputs: u128 },
    /// Stored hash differs from the recomputed one (transaction or block)
    HashMismatch {
        subject: &'static str,
        expected: String,
        actual: String,
    },
    IndexMismatch { expected: u64, actual: u64 },
    PrevHashMismatch { expected: String, actual: String },
    /// A candidate chain failed revalidation
    InvalidChain(String),
    /// Hash input could not be encoded
    Serialization(String),
    Network(String),
    Config(String),
    Io(String),
    /// The ledger actor is no longer accepting work
    LedgerStopped,
}

/// Wire-level name of an error, stable across the request layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    StructuralError,
    InsufficientFunds,
    PrevOutputNotFound,
    IncomeAlreadySpent,
    PrevOutputTargetMismatch,
    ValueMismatch,
    HashMismatch,
    IndexMismatch,
    PrevHashMismatch,
    InvalidChain,
    Serialization,
    Network,
    Config,
    Io,
    LedgerStopped,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Structural(_) => ErrorKind::StructuralError,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::PrevOutputNotFound { .. } => ErrorKind::PrevOutputNotFound,
            LedgerError::IncomeAlreadySpent { .. } => ErrorKind::IncomeAlreadySpent,
            LedgerError::PrevOutputTargetMismatch { .. } => ErrorKind::PrevOutputTargetMismatch,
            LedgerError::ValueMismatch { .. } => ErrorKind::ValueMismatch,
            LedgerError::HashMismatch { .. } => ErrorKind::HashMismatch,
            LedgerError::IndexMismatch { .. } => ErrorKind::IndexMismatch,
            LedgerError::PrevHashMismatch { .. } => ErrorKind::PrevHashMismatch,
            LedgerError::InvalidChain(_) => ErrorKind::InvalidChain,
            LedgerError::Serialization(_) => ErrorKind::Serialization,
            LedgerError::Network(_) => ErrorKind::Network,
            LedgerError::Config(_) => ErrorKind::Config,
            LedgerError::Io(_) => ErrorKind::Io,
            LedgerError::LedgerStopped => ErrorKind::LedgerStopped,
        }
    }

    /// Only an encoding failure while hashing is an internal contract violation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::Serialization(_))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Structural(msg) => write!(f, "Malformed transaction: {msg}"),
            LedgerError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            LedgerError::PrevOutputNotFound {
                transaction_hash,
                output_number,
            } => write!(
                f,
                "Previous output not found: {transaction_hash}:{output_number}"
            ),
            LedgerError::IncomeAlreadySpent {
                transaction_hash,
                output_number,
            } => write!(
                f,
                "Income already spent: {transaction_hash}:{output_number}"
            ),
            LedgerError::PrevOutputTargetMismatch { expected, actual } => write!(
                f,
                "Previous output target mismatch: expected {expected}, got {actual}"
            ),
            LedgerError::ValueMismatch { inputs, outputs } => {
                write!(f, "Value mismatch: inputs={inputs}, outputs={outputs}")
            }
            LedgerError::HashMismatch {
                subject,
                expected,
                actual,
            } => write!(
                f,
                "Invalid {subject} hash: expected {expected}, got {actual}"
            ),
            LedgerError::IndexMismatch { expected, actual } => {
                write!(f, "Invalid block index: expected {expected}, got {actual}")
            }
            LedgerError::PrevHashMismatch { expected, actual } => write!(
                f,
                "Invalid previous block hash: expected {expected}, got {actual}"
            ),
            LedgerError::InvalidChain(msg) => write!(f, "Invalid chain: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Network(msg) => write!(f, "Network error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::LedgerStopped => write!(f, "Ledger is not accepting submissions"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

// JSON errors outside hashing come from the wire. `hash_record` builds
// `Serialization` itself.
impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Network(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}
