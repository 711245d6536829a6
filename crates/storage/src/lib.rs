//! In-memory storage backend for regstore
//!
//! This crate implements the storage contract without any engine underneath:
//! - MemoryDb: FxHashMap-backed buckets behind one exclusive lock
//! - MemoryTx: in-place transaction with an undo journal (rollback replays it)
//! - Optional lock-acquire timeout

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;

pub use memory::{MemoryDb, MemoryTx};
