//! Durable backend for regstore
//!
//! This crate implements the storage contract on top of redb:
//! - DurableDb: file-backed (or in-memory) database handle
//! - DurableTx: read snapshot or the single write transaction
//! - DurabilityMode: when commits reach disk
//! - Table layout: buckets, record version chains, index entries

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod mode;
mod tables;
pub mod transaction;

pub use engine::{DurableConfig, DurableDb, DEFAULT_CACHE_SIZE};
pub use mode::DurabilityMode;
pub use transaction::DurableTx;
