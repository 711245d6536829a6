//! Core types for regstore
//!
//! This crate defines the storage contract shared by every backend:
//! - Db / Tx / TxExt: transactional bucket, record, index and sequence operations
//! - Error / ErrorKind: classified failures
//! - Codec: typed record encoding
//! - VersionLog: append-only per-record version chain

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod log;
pub mod traits;

pub use codec::Codec;
pub use error::{Error, ErrorKind, Result};
pub use log::VersionLog;
pub use traits::{Db, Tx, TxExt};
