//! In-memory storage backend.
//!
//! Stores every namespace as its own `BTreeMap` behind a single `RwLock`.
//! Nothing is persisted; all data is lost when the process exits. Use this
//! for unit tests and for stores that only need to live as long as the
//! process.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError, validate_namespace};

type Namespaces = BTreeMap<String, BTreeMap<String, String>>;

/// An in-memory storage backend.
///
/// Thread-safe and async-compatible. Clones share the same underlying data.
///
/// # Examples
///
/// ```
/// # use prefstore_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.put("app.prefs", "theme", "dark").await.unwrap();
/// let val = backend.get("app.prefs", "theme").await.unwrap();
/// assert_eq!(val.as_deref(), Some("dark"));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<Namespaces>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        validate_namespace(namespace)?;
        let data = self.data.read().await;
        Ok(data.get(namespace).and_then(|ns| ns.get(key)).cloned())
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        validate_namespace(namespace)?;
        let mut data = self.data.write().await;
        data.entry(namespace.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        validate_namespace(namespace)?;
        let mut data = self.data.write().await;
        if let Some(ns) = data.get_mut(namespace) {
            ns.remove(key);
            if ns.is_empty() {
                data.remove(namespace);
            }
        }
        Ok(())
    }

    async fn list(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
        validate_namespace(namespace)?;
        let data = self.data.read().await;
        Ok(data
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        validate_namespace(namespace)?;
        let data = self.data.read().await;
        Ok(data.get(namespace).is_some_and(|ns| ns.contains_key(key)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::conformance;

    #[tokio::test]
    async fn conformance_suite() {
        conformance::run_all(&MemoryBackend::new()).await;
    }

    #[tokio::test]
    async fn delete_last_key_drops_namespace() {
        let backend = MemoryBackend::new();
        backend.put("ns", "only", "v").await.unwrap();
        backend.delete("ns", "only").await.unwrap();
        assert!(backend.data.read().await.is_empty());
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        backend.put("ns", "key", "val").await.unwrap();
        let val = clone.get("ns", "key").await.unwrap();
        assert_eq!(val.as_deref(), Some("val"));
    }

    #[tokio::test]
    async fn concurrent_writers_to_distinct_keys() {
        let backend = MemoryBackend::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let b = backend.clone();
            handles.push(tokio::spawn(async move {
                b.put("ns", &format!("k{i:02}"), &i.to_string()).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(backend.list("ns").await.unwrap().len(), 16);
    }
}
