//! Backend selection for the CLI.
//!
//! Turns the `--storage`/`--path` options into a concrete
//! [`StorageBackend`]. Backends whose feature was not compiled in are
//! reported as errors instead of silently falling back to memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
#[cfg(any(feature = "redb-backend", feature = "rocksdb-backend"))]
use anyhow::Context;
use clap::ValueEnum;
use prefstore_storage::{MemoryBackend, StorageBackend};
use tracing::info;

/// Supported storage backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// In-memory (nothing survives the process).
    Memory,
    /// Single-file redb database.
    Redb,
    /// `RocksDB` database directory.
    Rocksdb,
}

impl StorageKind {
    /// Location used when no `--path` is given.
    #[must_use]
    pub fn default_path(self) -> &'static Path {
        match self {
            Self::Memory | Self::Redb => Path::new("./prefstore.redb"),
            Self::Rocksdb => Path::new("./prefstore-rocksdb"),
        }
    }
}

/// Where the preferences live.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: StorageKind,
    /// Explicit location; `None` selects [`StorageKind::default_path`].
    pub path: Option<PathBuf>,
}

impl BackendConfig {
    /// The file or directory the backend is opened at.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| self.kind.default_path())
    }

    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot be opened at `path`, or if its feature
    /// was not compiled into this binary.
    pub fn open(&self) -> Result<Arc<dyn StorageBackend>> {
        match self.kind {
            StorageKind::Memory => {
                info!("using in-memory storage (data will not persist)");
                Ok(Arc::new(MemoryBackend::new()))
            }
            StorageKind::Redb => self.open_redb(),
            StorageKind::Rocksdb => self.open_rocksdb(),
        }
    }

    #[cfg(feature = "redb-backend")]
    fn open_redb(&self) -> Result<Arc<dyn StorageBackend>> {
        info!(path = %self.path().display(), "using redb storage");
        let backend = prefstore_storage::RedbBackend::open(self.path())
            .with_context(|| format!("failed to open redb store at {}", self.path().display()))?;
        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "redb-backend"))]
    fn open_redb(&self) -> Result<Arc<dyn StorageBackend>> {
        anyhow::bail!("redb backend not compiled in (enable the `redb-backend` feature)")
    }

    #[cfg(feature = "rocksdb-backend")]
    fn open_rocksdb(&self) -> Result<Arc<dyn StorageBackend>> {
        info!(path = %self.path().display(), "using RocksDB storage");
        let backend = prefstore_storage::RocksDbBackend::open(self.path())
            .with_context(|| format!("failed to open RocksDB store at {}", self.path().display()))?;
        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "rocksdb-backend"))]
    fn open_rocksdb(&self) -> Result<Arc<dyn StorageBackend>> {
        anyhow::bail!("RocksDB backend not compiled in (enable the `rocksdb-backend` feature)")
    }
}
