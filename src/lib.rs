//! # regstore
//!
//! Embedded transactional record storage for registration services.
//!
//! Records live in named buckets, keyed by raw bytes. Every update appends a
//! new version instead of overwriting. Buckets can also hold secondary index
//! entries and hand out a monotonic sequence for minting identifiers.
//!
//! ## Quick Start
//!
//! ```ignore
//! use regstore::prelude::*;
//!
//! let store = Store::open("./records.redb")?;
//!
//! store.update(|tx| {
//!     tx.create_bucket_if_not_exists(b"invoices")?;
//!     let id = tx.next_sequence_for_bucket(b"invoices")?;
//!     tx.insert(b"invoices", &id.to_be_bytes(), &invoice)
//! })?;
//!
//! let all: Vec<Invoice> = store.view(|tx| tx.get_all(b"invoices"))?;
//! ```
//!
//! ## Backends
//!
//! - [`DurableDb`] - redb file, single writer with snapshot readers
//! - [`MemoryDb`] - process memory, every transaction serialized
//!
//! Both implement [`Db`]; [`Store`] picks one from a [`StoreConfig`].

#![warn(missing_docs)]

mod config;
mod database;

pub mod prelude;

// Re-export main entry points
pub use config::{Backend, StoreConfig, DEFAULT_PATH};
pub use database::{Store, StoreBuilder};

// Re-export the contract
pub use regstore_core::{Codec, Db, Error, ErrorKind, Result, Tx, TxExt, VersionLog};

// Re-export backends
pub use regstore_durability::{DurabilityMode, DurableConfig, DurableDb};
pub use regstore_storage::MemoryDb;
