//! Store configuration.
//!
//! The only setting is the namespace the adapter binds to. It can be given
//! explicitly or read from `PREFSTORE_NAMESPACE`; an unset or empty value
//! falls back to [`DEFAULT_NAMESPACE`].

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "chip.platform.KeyValueStore";

/// Environment variable holding the namespace override.
pub const NAMESPACE_ENV: &str = "PREFSTORE_NAMESPACE";

/// Configuration for [`PreferencesKeyValueStore::open`](crate::PreferencesKeyValueStore::open).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Namespace override. `None` selects [`DEFAULT_NAMESPACE`].
    pub namespace: Option<String>,
}

impl StoreConfig {
    /// Configuration bound to an explicit namespace.
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    /// Load configuration from the environment.
    ///
    /// Environment variables:
    /// - `PREFSTORE_NAMESPACE` — namespace to bind to (default: `chip.platform.KeyValueStore`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let namespace = lookup(NAMESPACE_ENV).filter(|ns| !ns.is_empty());
        Self { namespace }
    }

    /// The namespace this configuration resolves to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }
}
