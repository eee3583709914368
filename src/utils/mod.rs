//! Utility functions and helpers
//!
//! Hashing and time helpers shared by transactions and blocks.

pub mod crypto;

pub use crypto::{current_timestamp, hash_record, sha256_digest};
