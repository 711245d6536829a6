//! Store configuration.
//!
//! A [`StoreConfig`] selects the backend and its options. Every field has a
//! default, so a config file only needs the fields it changes:
//!
//! ```toml
//! backend = "durable"
//! path = "data/records.redb"
//! codec = "messagepack"
//! durability = "eventual"
//! ```

use regstore_core::{Codec, Error, Result};
use regstore_durability::{DurabilityMode, DurableConfig, DEFAULT_CACHE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default database file, relative to the working directory.
pub const DEFAULT_PATH: &str = "records.redb";

/// Which backend a [`Store`](crate::Store) runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// redb-backed, persistent
    #[default]
    Durable,
    /// redb over an in-memory backend; snapshot reads, lost on drop
    Ephemeral,
    /// Process memory, lost on drop
    Memory,
}

/// Configuration for opening a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to open
    pub backend: Backend,
    /// Database file (durable only)
    pub path: PathBuf,
    /// Record codec
    pub codec: Codec,
    /// Commit durability (durable and ephemeral)
    pub durability: DurabilityMode,
    /// Page cache size in bytes (durable and ephemeral)
    pub cache_size: usize,
    /// Give up waiting for the transaction lock after this long (memory only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: PathBuf::from(DEFAULT_PATH),
            codec: Codec::default(),
            durability: DurabilityMode::default(),
            cache_size: DEFAULT_CACHE_SIZE,
            lock_timeout_ms: None,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Options passed to the durable backend.
    pub fn durable_config(&self) -> DurableConfig {
        DurableConfig {
            cache_size: self.cache_size,
            durability: self.durability,
            codec: self.codec,
        }
    }

    /// Lock timeout as a [`Duration`].
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}
