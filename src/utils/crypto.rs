use crate::error::{LedgerError, Result};
use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LedgerError::Io(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u128 {
        return Err(LedgerError::Io("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// Hex SHA-256 over the JSON encoding of `record`.
///
/// Field order is the declaration order of the record type, so callers hash a
/// dedicated view struct that lists exactly the fields covered by the digest.
pub fn hash_record<T: Serialize>(record: &T) -> Result<String> {
    let bytes = serde_json::to_vec(record)
        .map_err(|e| LedgerError::Serialization(format!("Failed to encode hash input: {e}")))?;
    Ok(HEXLOWER.encode(&sha256_digest(&bytes)))
}
