//! Storage error types.
//!
//! Every variant carries the namespace, key or path it failed on, so a log
//! line is enough to diagnose the problem.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open the storage backend at the given path.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a value from storage.
    #[error("failed to read key '{key}' in namespace '{namespace}': {reason}")]
    Read {
        namespace: String,
        key: String,
        reason: String,
    },

    /// Failed to write a value to storage.
    #[error("failed to write key '{key}' in namespace '{namespace}': {reason}")]
    Write {
        namespace: String,
        key: String,
        reason: String,
    },

    /// Failed to delete a key from storage.
    #[error("failed to delete key '{key}' in namespace '{namespace}': {reason}")]
    Delete {
        namespace: String,
        key: String,
        reason: String,
    },

    /// Failed to list the keys of a namespace.
    #[error("failed to list keys in namespace '{namespace}': {reason}")]
    List { namespace: String, reason: String },

    /// A namespace table could not be opened.
    #[error("missing table '{name}'")]
    MissingTable { name: String },

    /// Failed to begin or commit a transaction.
    #[error("transaction failed: {reason}")]
    Transaction { reason: String },

    /// A stored key or value was not valid UTF-8.
    #[error("invalid encoding: {reason}")]
    InvalidKey { reason: String },

    /// The namespace name cannot be used.
    #[error("invalid namespace '{namespace}': {reason}")]
    InvalidNamespace { namespace: String, reason: String },
}
