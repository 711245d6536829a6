//! Convenient imports for regstore.
//!
//! ```ignore
//! use regstore::prelude::*;
//!
//! let store = Store::memory();
//! store.update(|tx| tx.create_bucket_if_not_exists(b"groups"))?;
//! ```

// Main entry point
pub use crate::database::{Store, StoreBuilder};

// Configuration
pub use crate::config::{Backend, StoreConfig};

// Contract
pub use regstore_core::{Codec, Db, Error, ErrorKind, Result, Tx, TxExt};

// Backends
pub use regstore_durability::{DurabilityMode, DurableDb};
pub use regstore_storage::MemoryDb;
