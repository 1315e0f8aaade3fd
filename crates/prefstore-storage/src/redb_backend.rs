//! Pure-Rust redb storage backend — the default.
//!
//! Each namespace is its own redb table, so namespaces never share a key
//! space and listing one namespace is a plain table scan. Tables are created
//! lazily by the first write; reading a namespace that was never written is
//! the same as reading an empty one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition, TableError};

use crate::{StorageBackend, StorageError, validate_namespace};

type Table<'a> = TableDefinition<'a, &'static str, &'static str>;

fn table_name(namespace: &str) -> String {
    format!("ns:{namespace}")
}

/// A storage backend backed by a single redb database file.
///
/// Thread-safe via `Arc<Database>`. Blocking redb calls are offloaded to the
/// Tokio blocking thread pool.
///
/// # Examples
///
/// ```no_run
/// # use prefstore_storage::RedbBackend;
/// let backend = RedbBackend::open("/var/lib/prefstore/prefs.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if redb fails to open or create the
    /// database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "opened redb preference store");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Return the filesystem path of this database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn transaction_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

fn join_error(e: &tokio::task::JoinError) -> String {
    format!("blocking task panicked: {e}")
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        validate_namespace(namespace)?;
        let db = Arc::clone(&self.db);
        let namespace = namespace.to_owned();
        let key = key.to_owned();
        let (ns, k) = (namespace.clone(), key.clone());
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_read().map_err(transaction_error)?;
            let name = table_name(&namespace);
            let table = match txn.open_table(Table::new(&name)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(e) => return Err(StorageError::MissingTable { name: format!("{name}: {e}") }),
            };
            let value = table
                .get(key.as_str())
                .map_err(|e| StorageError::Read {
                    namespace: namespace.clone(),
                    key: key.clone(),
                    reason: e.to_string(),
                })?
                .map(|v| v.value().to_owned());
            Ok(value)
        })
        .await
        .map_err(|e| StorageError::Read {
            namespace: ns,
            key: k,
            reason: join_error(&e),
        })?
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        validate_namespace(namespace)?;
        let db = Arc::clone(&self.db);
        let namespace = namespace.to_owned();
        let key = key.to_owned();
        let value = value.to_owned();
        let (ns, k) = (namespace.clone(), key.clone());
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_write().map_err(transaction_error)?;
            {
                let name = table_name(&namespace);
                let mut table = txn
                    .open_table(Table::new(&name))
                    .map_err(|e| StorageError::MissingTable {
                        name: format!("{name}: {e}"),
                    })?;
                table
                    .insert(key.as_str(), value.as_str())
                    .map_err(|e| StorageError::Write {
                        namespace: namespace.clone(),
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(transaction_error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Write {
            namespace: ns,
            key: k,
            reason: join_error(&e),
        })?
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        validate_namespace(namespace)?;
        let db = Arc::clone(&self.db);
        let namespace = namespace.to_owned();
        let key = key.to_owned();
        let (ns, k) = (namespace.clone(), key.clone());
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_write().map_err(transaction_error)?;
            {
                let name = table_name(&namespace);
                let mut table = txn
                    .open_table(Table::new(&name))
                    .map_err(|e| StorageError::MissingTable {
                        name: format!("{name}: {e}"),
                    })?;
                // remove() returns Ok(None) for a missing key.
                table
                    .remove(key.as_str())
                    .map_err(|e| StorageError::Delete {
                        namespace: namespace.clone(),
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(transaction_error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Delete {
            namespace: ns,
            key: k,
            reason: join_error(&e),
        })?
    }

    async fn list(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
        validate_namespace(namespace)?;
        let db = Arc::clone(&self.db);
        let namespace = namespace.to_owned();
        let ns = namespace.clone();
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_read().map_err(transaction_error)?;
            let name = table_name(&namespace);
            let table = match txn.open_table(Table::new(&name)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
                Err(e) => return Err(StorageError::MissingTable { name: format!("{name}: {e}") }),
            };

            let list_error = |e: redb::StorageError| StorageError::List {
                namespace: namespace.clone(),
                reason: e.to_string(),
            };
            let mut keys = Vec::new();
            for item in table.iter().map_err(list_error)? {
                let (k, _) = item.map_err(list_error)?;
                keys.push(k.value().to_owned());
            }
            Ok(keys)
        })
        .await
        .map_err(|e| StorageError::List {
            namespace: ns,
            reason: join_error(&e),
        })?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::conformance;

    fn temp_backend() -> (tempfile::TempDir, RedbBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("prefs.redb")).unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn conformance_suite() {
        let (_dir, backend) = temp_backend();
        conformance::run_all(&backend).await;
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.redb");
        {
            let backend = RedbBackend::open(&path).unwrap();
            backend.put("chip", "AndroidICAC1", "cert").await.unwrap();
        }
        let backend = RedbBackend::open(&path).unwrap();
        assert_eq!(
            backend.get("chip", "AndroidICAC1").await.unwrap().as_deref(),
            Some("cert")
        );
        assert_eq!(backend.path(), path.as_path());
    }

    #[tokio::test]
    async fn open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = RedbBackend::open(dir.path().join("no/such/dir/prefs.redb")).unwrap_err();
        assert!(matches!(err, StorageError::Open { .. }));
    }
}
