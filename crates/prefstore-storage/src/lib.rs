//! Preference store backends for `prefstore`.
//!
//! This crate defines the [`StorageBackend`] trait: a namespaced string
//! key-value interface that knows nothing about credentials or what the
//! stored values mean. The adapter in `prefstore-core` sits on top of one
//! backend and one namespace.
//!
//! Three implementations are provided:
//!
//! - [`RedbBackend`] — default, pure-Rust single-file store (feature `redb-backend`)
//! - [`RocksDbBackend`] — backed by `RocksDB` (feature `rocksdb-backend`)
//! - [`MemoryBackend`] — in-memory, for tests and throwaway stores

mod error;
mod memory;
#[cfg(feature = "redb-backend")]
mod redb_backend;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use error::StorageError;
pub use memory::MemoryBackend;
#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDbBackend;

/// Check that `namespace` can be used as a preference namespace.
///
/// Any string is a namespace, the empty string included, except one
/// containing NUL, which the `RocksDB` backend uses to separate the
/// namespace from the key.
///
/// # Errors
///
/// Returns [`StorageError::InvalidNamespace`] if `namespace` contains NUL.
pub fn validate_namespace(namespace: &str) -> Result<(), StorageError> {
    if namespace.contains('\0') {
        return Err(StorageError::InvalidNamespace {
            namespace: namespace.escape_default().to_string(),
            reason: "namespace must not contain NUL".to_owned(),
        });
    }
    Ok(())
}

/// A pluggable, namespaced preference store.
///
/// Every entry lives in exactly one namespace; the same key in two
/// namespaces names two unrelated entries. Keys and values are arbitrary
/// UTF-8 strings.
///
/// Each call is atomic and durable once it returns `Ok`. Implementations
/// must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve the value stored under `key` in `namespace`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails, or
    /// [`StorageError::InvalidNamespace`] for a malformed namespace.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key` in `namespace`, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting a non-existent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// List every key in `namespace`, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the underlying backend fails.
    async fn list(&self, namespace: &str) -> Result<Vec<String>, StorageError>;

    /// Check whether a key exists in `namespace`.
    ///
    /// The default implementation calls [`get`](StorageBackend::get) and checks
    /// for `Some`. Backends may override this with a cheaper check.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn exists(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(namespace, key).await?.is_some())
    }
}
