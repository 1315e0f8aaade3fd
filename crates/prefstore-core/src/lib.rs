//! Core library for `prefstore`.
//!
//! Provides [`store::PreferencesKeyValueStore`], a string key-value adapter
//! bound to one namespace of a [`prefstore_storage::StorageBackend`], and the
//! well-known credential keys it can check for. The adapter forwards every
//! call to the backend and only adds diagnostics on top.

pub mod config;
pub mod credentials;
pub mod error;
pub mod store;

pub use config::{DEFAULT_NAMESPACE, StoreConfig};
pub use credentials::CredentialKey;
pub use error::StoreError;
pub use store::{CredentialStatus, KeyValueStoreManager, PreferencesKeyValueStore};
