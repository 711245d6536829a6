//! Main entry point for regstore.
//!
//! This module provides [`Store`], which runs the storage contract on either
//! backend, and [`StoreBuilder`] for configuring it.

use crate::config::{Backend, StoreConfig};
use regstore_core::{Codec, Db, Result, Tx};
use regstore_durability::{DurabilityMode, DurableDb};
use regstore_storage::MemoryDb;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// A database on either backend.
///
/// Callers hold a `Store` (or any other [`Db`]) and never name the backend
/// again after opening it.
///
/// # Example
///
/// ```ignore
/// use regstore::prelude::*;
///
/// let store = Store::open("./records.redb")?;
/// store.update(|tx| tx.create_bucket_if_not_exists(b"groups"))?;
/// ```
#[derive(Debug)]
pub enum Store {
    /// redb-backed database
    Durable(DurableDb),
    /// In-memory database
    Memory(MemoryDb),
}

impl Store {
    /// Open a durable store at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an empty in-memory store.
    pub fn memory() -> Self {
        Store::Memory(MemoryDb::new())
    }

    /// Create a durable store with no backing file.
    ///
    /// Keeps the durable backend's snapshot semantics, without disk I/O.
    ///
    /// | Method | Disk Files | Concurrent views |
    /// |--------|------------|------------------|
    /// | `Store::memory()` | None | Serialized |
    /// | `Store::ephemeral()` | None | Snapshot |
    /// | `Store::open(path)` | User file | Snapshot |
    pub fn ephemeral() -> Result<Self> {
        Self::builder().ephemeral().open()
    }

    /// Open the store described by `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let store = match config.backend {
            Backend::Durable => Store::Durable(DurableDb::open_with_config(
                &config.path,
                config.durable_config(),
            )?),
            Backend::Ephemeral => {
                Store::Durable(DurableDb::in_memory_with_config(config.durable_config())?)
            }
            Backend::Memory => {
                let db = MemoryDb::with_codec(config.codec);
                Store::Memory(match config.lock_timeout() {
                    Some(timeout) => db.with_lock_timeout(timeout),
                    None => db,
                })
            }
        };
        info!(backend = ?config.backend, codec = config.codec.name(), "store opened");
        Ok(store)
    }

    /// Create a builder for store configuration.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Backend this store runs on.
    pub fn backend(&self) -> Backend {
        match self {
            Store::Durable(db) if db.path().is_some() => Backend::Durable,
            Store::Durable(_) => Backend::Ephemeral,
            Store::Memory(_) => Backend::Memory,
        }
    }

    /// Codec used for typed operations.
    pub fn codec(&self) -> Codec {
        match self {
            Store::Durable(db) => db.config().codec,
            Store::Memory(db) => db.codec(),
        }
    }
}

impl Db for Store {
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T>,
    {
        match self {
            Store::Durable(db) => db.update(f),
            Store::Memory(db) => db.update(f),
        }
    }

    fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T>,
    {
        match self {
            Store::Durable(db) => db.view(f),
            Store::Memory(db) => db.view(f),
        }
    }
}

/// Builder for store configuration.
///
/// # Example
///
/// ```ignore
/// // Production: file-backed, fsync on every commit
/// let store = Store::builder()
///     .path("./records.redb")
///     .strict()
///     .open()?;
///
/// // Unit testing: in-memory, bounded lock wait
/// let store = Store::builder()
///     .memory()
///     .lock_timeout(Duration::from_millis(100))
///     .open()?;
/// ```
///
/// Backend selectors (`path`, `ephemeral`, `memory`) override each other;
/// the last one called wins.
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    config: StoreConfig,
}

impl StoreBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Set the database file (selects the durable backend).
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.backend = Backend::Durable;
        self.config.path = path.as_ref().to_path_buf();
        self
    }

    /// Use the in-memory backend.
    pub fn memory(mut self) -> Self {
        self.config.backend = Backend::Memory;
        self
    }

    /// Use the durable backend without a backing file.
    pub fn ephemeral(mut self) -> Self {
        self.config.backend = Backend::Ephemeral;
        self
    }

    /// Select the record codec.
    pub fn codec(mut self, codec: Codec) -> Self {
        self.config.codec = codec;
        self
    }

    /// Select the commit durability.
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.config.durability = mode;
        self
    }

    /// Never wait for fsync. Recent commits may be lost on crash.
    pub fn no_durability(self) -> Self {
        self.durability(DurabilityMode::None)
    }

    /// fsync on every commit (default).
    pub fn strict(self) -> Self {
        self.durability(DurabilityMode::Strict)
    }

    /// Page cache size in bytes.
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.config.cache_size = bytes;
        self
    }

    /// Bound how long a memory-backend transaction waits for the lock.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open the store.
    pub fn open(self) -> Result<Store> {
        Store::from_config(&self.config)
    }
}
