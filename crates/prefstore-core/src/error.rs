//! Error types for `prefstore-core`.
//!
//! A missing key is never an error; lookups return `Ok(None)`. Errors only
//! describe storage faults and undecodable values. Stored values are never
//! included in error messages.

use prefstore_storage::StorageError;

/// Errors from the preference store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying storage backend returned an error.
    #[error("preference storage error: {0}")]
    Storage(#[from] StorageError),

    /// A value stored as base64 text could not be decoded.
    #[error("value of key '{key}' is not valid base64: {reason}")]
    Decode { key: String, reason: String },
}
