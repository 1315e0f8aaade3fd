//! Namespaced preference key-value store.
//!
//! [`PreferencesKeyValueStore`] binds one namespace of a storage backend and
//! exposes plain string get/set/delete over it, plus presence checks for the
//! credential entries in [`crate::credentials`].
//!
//! # Write visibility
//!
//! `set` and `delete` return only after the backend has applied the write.
//! Once they return `Ok`, every later `get` on any task sharing the backend
//! observes the write.
//!
//! Every read is logged at `debug` level with its key and value (or its
//! absence). The log output is diagnostics only.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use prefstore_storage::{StorageBackend, validate_namespace};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::credentials::CredentialKey;
use crate::error::StoreError;

/// String key-value contract consumed by the rest of the system.
#[async_trait::async_trait]
pub trait KeyValueStoreManager: Send + Sync {
    /// Value stored under `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Which credential entries are currently stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialStatus {
    pub issuer_keypair: bool,
    pub root_certificate: bool,
    pub intermediate_certificate: bool,
}

impl CredentialStatus {
    /// Presence of a single credential.
    #[must_use]
    pub const fn is_present(&self, key: CredentialKey) -> bool {
        match key {
            CredentialKey::IssuerKeypair => self.issuer_keypair,
            CredentialKey::RootCertificate => self.root_certificate,
            CredentialKey::IntermediateCertificate => self.intermediate_certificate,
        }
    }

    /// True when all three credentials are stored.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.issuer_keypair && self.root_certificate && self.intermediate_certificate
    }
}

/// A [`KeyValueStoreManager`] backed by one namespace of a [`StorageBackend`].
///
/// Cloning is cheap and clones share the backend.
#[derive(Clone)]
pub struct PreferencesKeyValueStore {
    storage: Arc<dyn StorageBackend>,
    namespace: String,
}

impl std::fmt::Debug for PreferencesKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesKeyValueStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PreferencesKeyValueStore {
    /// Bind to the namespace named by `config` on `storage`.
    ///
    /// No I/O happens here; a namespace comes into existence with its first
    /// write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the configured namespace contains
    /// NUL. Every other name, the empty string included, is accepted.
    pub fn open(storage: Arc<dyn StorageBackend>, config: &StoreConfig) -> Result<Self, StoreError> {
        let namespace = config.namespace();
        validate_namespace(namespace)?;
        info!(namespace = %namespace, "preference store opened");
        Ok(Self {
            storage,
            namespace: namespace.to_owned(),
        })
    }

    /// The namespace this store is bound to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether the issuer keypair is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend read fails.
    pub async fn is_issuer_key_present(&self) -> Result<bool, StoreError> {
        self.is_present(CredentialKey::IssuerKeypair).await
    }

    /// Whether the root certificate is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend read fails.
    pub async fn is_rcac_present(&self) -> Result<bool, StoreError> {
        self.is_present(CredentialKey::RootCertificate).await
    }

    /// Whether the intermediate certificate is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend read fails.
    pub async fn is_icac_present(&self) -> Result<bool, StoreError> {
        self.is_present(CredentialKey::IntermediateCertificate).await
    }

    /// Presence of all three credential entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if any backend read fails.
    pub async fn credential_status(&self) -> Result<CredentialStatus, StoreError> {
        Ok(CredentialStatus {
            issuer_keypair: self.is_issuer_key_present().await?,
            root_certificate: self.is_rcac_present().await?,
            intermediate_certificate: self.is_icac_present().await?,
        })
    }

    async fn is_present(&self, key: CredentialKey) -> Result<bool, StoreError> {
        Ok(self.get(key.as_str()).await?.is_some())
    }

    /// Whether `key` has a value, without reading or logging the value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend read fails.
    pub async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.storage.exists(&self.namespace, key).await?)
    }

    /// Every key in the namespace, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend listing fails.
    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.storage.list(&self.namespace).await?)
    }

    /// Read a binary value stored as base64 text.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Storage`] if the backend read fails.
    /// - [`StoreError::Decode`] if the stored text is not valid base64.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(text) = self.get(key).await? else {
            return Ok(None);
        };
        STANDARD
            .decode(text.as_bytes())
            .map(Some)
            .map_err(|e| StoreError::Decode {
                key: key.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Store a binary value as base64 text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend write fails.
    pub async fn set_bytes(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.set(key, &STANDARD.encode(value)).await
    }
}

#[async_trait::async_trait]
impl KeyValueStoreManager for PreferencesKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self.storage.get(&self.namespace, key).await?;
        match &value {
            Some(v) => debug!(namespace = %self.namespace, key = %key, value = %v, "preference read"),
            None => debug!(namespace = %self.namespace, key = %key, "key not found in preference store"),
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.put(&self.namespace, key, value).await?;
        debug!(namespace = %self.namespace, key = %key, "preference written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.storage.delete(&self.namespace, key).await?;
        debug!(namespace = %self.namespace, key = %key, "preference removed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::credentials::{INTERMEDIATE_CERTIFICATE_KEY, ISSUER_KEYPAIR_KEY, ROOT_CERTIFICATE_KEY};
    use prefstore_storage::{MemoryBackend, StorageError};

    fn open_store(namespace: &str) -> PreferencesKeyValueStore {
        PreferencesKeyValueStore::open(
            Arc::new(MemoryBackend::new()),
            &StoreConfig::with_namespace(namespace),
        )
        .unwrap()
    }

    /// Backend whose every operation fails.
    struct BrokenBackend;

    #[async_trait::async_trait]
    impl StorageBackend for BrokenBackend {
        async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Read {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
                reason: "disk on fire".to_owned(),
            })
        }

        async fn put(&self, namespace: &str, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
                reason: "disk on fire".to_owned(),
            })
        }

        async fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
            Err(StorageError::Delete {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
                reason: "disk on fire".to_owned(),
            })
        }

        async fn list(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
            Err(StorageError::List {
                namespace: namespace.to_owned(),
                reason: "disk on fire".to_owned(),
            })
        }
    }

    #[tokio::test]
    async fn walkthrough_on_empty_namespace() {
        let store = open_store("test.store");

        assert_eq!(store.get("missing").await.unwrap(), None);
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert!(!store.is_issuer_key_present().await.unwrap());
        store.set("AndroidDeviceControllerKey", "xyz").await.unwrap();
        assert!(store.is_issuer_key_present().await.unwrap());
        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_returns_latest_value() {
        let store = open_store("test.store");
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn delete_absent_key_is_noop() {
        let store = open_store("test.store");
        store.delete("never-set").await.unwrap();
        assert_eq!(store.get("never-set").await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_value_is_present() {
        let store = open_store("test.store");
        store.set(ROOT_CERTIFICATE_KEY, "").await.unwrap();
        assert_eq!(store.get(ROOT_CERTIFICATE_KEY).await.unwrap().as_deref(), Some(""));
        assert!(store.is_rcac_present().await.unwrap());
    }

    #[tokio::test]
    async fn presence_checks_track_each_key() {
        let store = open_store("test.store");
        assert_eq!(store.credential_status().await.unwrap(), CredentialStatus::default());

        store.set(ROOT_CERTIFICATE_KEY, "rcac").await.unwrap();
        assert!(store.is_rcac_present().await.unwrap());
        assert!(!store.is_icac_present().await.unwrap());
        assert!(!store.is_issuer_key_present().await.unwrap());

        store.set(INTERMEDIATE_CERTIFICATE_KEY, "icac").await.unwrap();
        store.set(ISSUER_KEYPAIR_KEY, "kp").await.unwrap();
        let status = store.credential_status().await.unwrap();
        assert!(status.is_complete());
        assert!(CredentialKey::ALL.iter().all(|k| status.is_present(*k)));

        store.delete(INTERMEDIATE_CERTIFICATE_KEY).await.unwrap();
        let status = store.credential_status().await.unwrap();
        assert!(!status.intermediate_certificate);
        assert!(!status.is_complete());
    }

    #[tokio::test]
    async fn namespaces_on_one_backend_are_isolated() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let first =
            PreferencesKeyValueStore::open(Arc::clone(&backend), &StoreConfig::with_namespace("one")).unwrap();
        let second =
            PreferencesKeyValueStore::open(Arc::clone(&backend), &StoreConfig::with_namespace("two")).unwrap();

        first.set(ISSUER_KEYPAIR_KEY, "kp").await.unwrap();
        assert!(first.is_issuer_key_present().await.unwrap());
        assert!(!second.is_issuer_key_present().await.unwrap());
        assert_eq!(second.keys().await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn default_config_uses_canonical_namespace() {
        let store =
            PreferencesKeyValueStore::open(Arc::new(MemoryBackend::new()), &StoreConfig::default()).unwrap();
        assert_eq!(store.namespace(), crate::DEFAULT_NAMESPACE);
    }

    #[test]
    fn open_rejects_invalid_namespace() {
        let err = PreferencesKeyValueStore::open(
            Arc::new(MemoryBackend::new()),
            &StoreConfig::with_namespace("bad\0name"),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::InvalidNamespace { .. })));
    }

    #[tokio::test]
    async fn empty_namespace_is_usable() {
        let store = open_store("");
        assert_eq!(store.namespace(), "");
        assert!(!store.is_issuer_key_present().await.unwrap());
        store.set(ISSUER_KEYPAIR_KEY, "kp").await.unwrap();
        assert!(store.is_issuer_key_present().await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec![ISSUER_KEYPAIR_KEY]);
    }

    #[tokio::test]
    async fn keys_and_contains() {
        let store = open_store("test.store");
        store.set("b", "2").await.unwrap();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["a", "b"]);
        assert!(store.contains("a").await.unwrap());
        assert!(!store.contains("c").await.unwrap());
    }

    #[tokio::test]
    async fn bytes_are_stored_as_base64_text() {
        let store = open_store("test.store");
        let der = [0x30_u8, 0x82, 0x01, 0x9a, 0x00, 0xff];
        store.set_bytes(ROOT_CERTIFICATE_KEY, &der).await.unwrap();

        assert_eq!(
            store.get(ROOT_CERTIFICATE_KEY).await.unwrap().as_deref(),
            Some("MIIBmgD/")
        );
        assert_eq!(
            store.get_bytes(ROOT_CERTIFICATE_KEY).await.unwrap().as_deref(),
            Some(der.as_slice())
        );
        assert_eq!(store.get_bytes("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_base64_value_fails_to_decode() {
        let store = open_store("test.store");
        store.set("text", "not base64!").await.unwrap();
        let err = store.get_bytes("text").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref key, .. } if key == "text"));
    }

    #[tokio::test]
    async fn backend_failures_propagate() {
        let store =
            PreferencesKeyValueStore::open(Arc::new(BrokenBackend), &StoreConfig::default()).unwrap();

        assert!(matches!(
            store.get("k").await,
            Err(StoreError::Storage(StorageError::Read { .. }))
        ));
        assert!(matches!(
            store.set("k", "v").await,
            Err(StoreError::Storage(StorageError::Write { .. }))
        ));
        assert!(matches!(
            store.delete("k").await,
            Err(StoreError::Storage(StorageError::Delete { .. }))
        ));
        assert!(store.is_icac_present().await.is_err());
        assert!(store.keys().await.is_err());
    }

    #[tokio::test]
    async fn usable_as_trait_object_across_tasks() {
        let store: Arc<dyn KeyValueStoreManager> = Arc::new(open_store("test.store"));
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let key = format!("key-{i}");
                store.set(&key, &i.to_string()).await.unwrap();
                store.get(&key).await.unwrap()
            }));
        }
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.await.unwrap(), Some(i.to_string()));
        }
    }
}
