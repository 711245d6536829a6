//! The durable database handle.
//!
//! [`DurableDb`] owns a redb [`Database`]. Write transactions are serialized
//! by redb; read transactions see the last committed snapshot and never block
//! on a writer.

use crate::mode::DurabilityMode;
use crate::tables::{engine_err, open_write};
use crate::transaction::DurableTx;
use redb::Database;
use regstore_core::{Codec, Db, Result, Tx};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default redb page cache size (64 MiB).
pub const DEFAULT_CACHE_SIZE: usize = 64 * 1024 * 1024;

/// Options for opening a [`DurableDb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurableConfig {
    /// Page cache size in bytes
    pub cache_size: usize,
    /// When commits reach disk
    pub durability: DurabilityMode,
    /// Codec for typed operations
    pub codec: Codec,
}

impl Default for DurableConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            durability: DurabilityMode::default(),
            codec: Codec::default(),
        }
    }
}

/// A file-backed transactional database.
pub struct DurableDb {
    db: Database,
    path: Option<PathBuf>,
    config: DurableConfig,
}

impl DurableDb {
    /// Open (creating if missing) the database file at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, DurableConfig::default())
    }

    /// Open (creating if missing) the database file at `path`.
    ///
    /// Parent directories are created as needed.
    pub fn open_with_config(path: impl AsRef<Path>, config: DurableConfig) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::builder()
            .set_cache_size(config.cache_size)
            .create(path)
            .map_err(engine_err)?;

        info!(
            path = %path.display(),
            durability = config.durability.description(),
            codec = config.codec.name(),
            "durable database opened"
        );
        Self::bootstrap(db, Some(path.to_path_buf()), config)
    }

    /// Open a database that lives only in memory.
    ///
    /// Behaves exactly like a file-backed one, including snapshot reads.
    pub fn in_memory() -> Result<Self> {
        Self::in_memory_with_config(DurableConfig::default())
    }

    /// Open an in-memory database with explicit options.
    pub fn in_memory_with_config(config: DurableConfig) -> Result<Self> {
        let db = Database::builder()
            .set_cache_size(config.cache_size)
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(engine_err)?;
        debug!(
            durability = config.durability.description(),
            "in-memory durable database opened"
        );
        Self::bootstrap(db, None, config)
    }

    /// Create the tables so that read transactions can always open them.
    fn bootstrap(db: Database, path: Option<PathBuf>, config: DurableConfig) -> Result<Self> {
        let txn = db.begin_write().map_err(engine_err)?;
        drop(open_write(&txn)?);
        txn.commit().map_err(engine_err)?;
        Ok(Self { db, path, config })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Options this database was opened with.
    pub fn config(&self) -> &DurableConfig {
        &self.config
    }
}

impl std::fmt::Debug for DurableDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableDb")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish()
    }
}

impl Db for DurableDb {
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T>,
    {
        let mut txn = self.db.begin_write().map_err(engine_err)?;
        txn.set_durability(self.config.durability.to_redb());
        let mut tx = DurableTx::write(txn, self.config.codec);

        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = tx.abort() {
                    warn!(error = %abort_err, "failed to abort durable transaction");
                }
                debug!(error = %e, "durable transaction rolled back");
                Err(e)
            }
        }
    }

    fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T>,
    {
        let txn = self.db.begin_read().map_err(engine_err)?;
        let mut tx = DurableTx::read(txn, self.config.codec);
        f(&mut tx)
    }
}
