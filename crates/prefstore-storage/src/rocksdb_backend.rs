//! `RocksDB` storage backend.
//!
//! All namespaces share one key space. An entry is stored under the
//! composite key `<namespace>\0<key>`; since namespaces cannot contain NUL,
//! the prefix `<namespace>\0` selects exactly one namespace. All operations
//! are dispatched to a blocking thread via [`tokio::task::spawn_blocking`]
//! since `RocksDB` is a synchronous C++ library.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options};

use crate::{StorageBackend, StorageError, validate_namespace};

type Db = DBWithThreadMode<MultiThreaded>;

fn namespace_prefix(namespace: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(namespace.len() + 1);
    prefix.extend_from_slice(namespace.as_bytes());
    prefix.push(0);
    prefix
}

fn composite_key(namespace: &str, key: &str) -> Vec<u8> {
    let mut composite = namespace_prefix(namespace);
    composite.extend_from_slice(key.as_bytes());
    composite
}

/// A storage backend backed by `RocksDB`.
///
/// Thread-safe (`Arc<DB>` internally) and safe to share across async tasks.
///
/// # Examples
///
/// ```no_run
/// # use prefstore_storage::RocksDbBackend;
/// let backend = RocksDbBackend::open("/var/lib/prefstore/data").unwrap();
/// ```
#[derive(Clone)]
pub struct RocksDbBackend {
    db: Arc<Db>,
    path: PathBuf,
}

impl std::fmt::Debug for RocksDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RocksDbBackend {
    /// Open a `RocksDB` database at the given path.
    ///
    /// Creates the database directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if `RocksDB` fails to open or create the
    /// database at the specified path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Db::open(&opts, path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "opened RocksDB preference store");

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

#[async_trait::async_trait]
impl StorageBackend for RocksDbBackend {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        validate_namespace(namespace)?;
        let db = Arc::clone(&self.db);
        let composite = composite_key(namespace, key);
        let (ns, k) = (namespace.to_owned(), key.to_owned());
        let (join_ns, join_k) = (ns.clone(), k.clone());
        tokio::task::spawn_blocking(move || {
            let raw = db.get(&composite).map_err(|e| StorageError::Read {
                namespace: ns.clone(),
                key: k.clone(),
                reason: e.to_string(),
            })?;
            raw.map(|bytes| {
                String::from_utf8(bytes).map_err(|e| StorageError::InvalidKey {
                    reason: format!("value of '{k}' in '{ns}': {e}"),
                })
            })
            .transpose()
        })
        .await
        .map_err(|e| StorageError::Read {
            namespace: join_ns,
            key: join_k,
            reason: format!("blocking task panicked: {e}"),
        })?
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        validate_namespace(namespace)?;
        let db = Arc::clone(&self.db);
        let composite = composite_key(namespace, key);
        let value = value.to_owned();
        let (ns, k) = (namespace.to_owned(), key.to_owned());
        let (join_ns, join_k) = (ns.clone(), k.clone());
        tokio::task::spawn_blocking(move || {
            db.put(&composite, value.as_bytes())
                .map_err(|e| StorageError::Write {
                    namespace: ns,
                    key: k,
                    reason: e.to_string(),
                })
        })
        .await
        .map_err(|e| StorageError::Write {
            namespace: join_ns,
            key: join_k,
            reason: format!("blocking task panicked: {e}"),
        })?
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        validate_namespace(namespace)?;
        let db = Arc::clone(&self.db);
        let composite = composite_key(namespace, key);
        let (ns, k) = (namespace.to_owned(), key.to_owned());
        let (join_ns, join_k) = (ns.clone(), k.clone());
        tokio::task::spawn_blocking(move || {
            db.delete(&composite).map_err(|e| StorageError::Delete {
                namespace: ns,
                key: k,
                reason: e.to_string(),
            })
        })
        .await
        .map_err(|e| StorageError::Delete {
            namespace: join_ns,
            key: join_k,
            reason: format!("blocking task panicked: {e}"),
        })?
    }

    async fn list(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
        validate_namespace(namespace)?;
        let db = Arc::clone(&self.db);
        let ns = namespace.to_owned();
        let join_ns = ns.clone();
        tokio::task::spawn_blocking(move || {
            let prefix = namespace_prefix(&ns);
            let iter = db.iterator(IteratorMode::From(prefix.as_slice(), Direction::Forward));

            let mut keys = Vec::new();
            for item in iter {
                let (k, _) = item.map_err(|e| StorageError::List {
                    namespace: ns.clone(),
                    reason: e.to_string(),
                })?;
                let Some(suffix) = k.strip_prefix(prefix.as_slice()) else {
                    break;
                };
                let key = String::from_utf8(suffix.to_vec()).map_err(|e| {
                    StorageError::InvalidKey {
                        reason: e.to_string(),
                    }
                })?;
                keys.push(key);
            }
            Ok(keys)
        })
        .await
        .map_err(|e| StorageError::List {
            namespace: join_ns,
            reason: format!("blocking task panicked: {e}"),
        })?
    }
}
