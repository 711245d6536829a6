//! The storage contract.
//!
//! Every backend implements [`Db`] and hands callers a [`Tx`]. `Tx` is
//! object-safe and works on raw bytes; the typed operations live on
//! [`TxExt`], which is implemented for every `Tx` (including `dyn Tx`).
//!
//! ```ignore
//! use regstore_core::{Db, TxExt};
//!
//! db.update(|tx| {
//!     tx.create_bucket_if_not_exists(b"invoices")?;
//!     let id = tx.next_sequence_for_bucket(b"invoices")?;
//!     tx.insert(b"invoices", &id.to_be_bytes(), &invoice)
//! })?;
//!
//! let invoice: Invoice = db.view(|tx| tx.get(b"invoices", &id.to_be_bytes()))?;
//! ```

use crate::codec::Codec;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A transactional database.
///
/// # Transactions
///
/// - [`Db::update`] runs `f` in a writable transaction. The transaction
///   commits iff `f` returns `Ok`; otherwise every write made by `f` is
///   discarded and `f`'s error is returned.
/// - [`Db::view`] runs `f` against a consistent read-only snapshot. Mutating
///   calls inside it fail with [`ErrorKind::TxNotWritable`](crate::ErrorKind).
///
/// At most one writable transaction is in flight per instance.
pub trait Db: Send + Sync {
    /// Run `f` in a read-write transaction.
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T>;

    /// Run `f` in a read-only transaction.
    fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T>;
}

/// Byte-level transaction operations.
///
/// Keys are compared as raw bytes. Enumerations are ordered ascending by key.
pub trait Tx {
    /// Whether this transaction may mutate.
    fn is_writable(&self) -> bool;

    /// Codec used for typed operations.
    fn codec(&self) -> Codec;

    /// Create `bucket` unless it already exists.
    fn create_bucket_if_not_exists(&mut self, bucket: &[u8]) -> Result<()>;

    /// Start a new version chain for `key`.
    ///
    /// Fails with key-exists if `key` already has one.
    fn insert_bytes(&mut self, bucket: &[u8], key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Append a new latest version to `key`'s chain.
    ///
    /// Fails with key-missing if there is no chain.
    fn update_bytes(&mut self, bucket: &[u8], key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Latest version of `key`.
    fn get_bytes(&self, bucket: &[u8], key: &[u8]) -> Result<Vec<u8>>;

    /// `(key, latest version)` for every record in `bucket`, by key.
    fn get_all_bytes(&self, bucket: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Map `index_key` to `primary_key`.
    ///
    /// Fails with key-exists if `index_key` is already mapped.
    fn add_index(
        &mut self,
        index_bucket: &[u8],
        index_key: &[u8],
        primary_key: &[u8],
    ) -> Result<()>;

    /// Primary key that `index_key` maps to.
    fn index_target(&self, index_bucket: &[u8], index_key: &[u8]) -> Result<Vec<u8>>;

    /// `(index key, primary key)` for every entry in `index_bucket`, by index key.
    fn index_entries(&self, index_bucket: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Delete every entry of `index_bucket` whose target is `primary_key`.
    fn remove_key_from_index(&mut self, index_bucket: &[u8], primary_key: &[u8]) -> Result<()>;

    /// Increment and return `bucket`'s sequence. The first call returns 1.
    fn next_sequence_for_bucket(&mut self, bucket: &[u8]) -> Result<u64>;
}

/// Typed record operations, encoded with [`Tx::codec`].
pub trait TxExt: Tx {
    /// Encode `value` and insert it under `key`.
    fn insert<V: Serialize + ?Sized>(
        &mut self,
        bucket: &[u8],
        key: &[u8],
        value: &V,
    ) -> Result<()> {
        let bytes = self.codec().encode(value)?;
        self.insert_bytes(bucket, key, bytes)
    }

    /// Encode `value` and append it as `key`'s latest version.
    fn update<V: Serialize + ?Sized>(
        &mut self,
        bucket: &[u8],
        key: &[u8],
        value: &V,
    ) -> Result<()> {
        let bytes = self.codec().encode(value)?;
        self.update_bytes(bucket, key, bytes)
    }

    /// Decode the latest version of `key`.
    fn get<V: DeserializeOwned>(&self, bucket: &[u8], key: &[u8]) -> Result<V> {
        let bytes = self.get_bytes(bucket, key)?;
        self.codec().decode(&bytes)
    }

    /// Decode every record in `bucket`, ordered by primary key.
    fn get_all<V: DeserializeOwned>(&self, bucket: &[u8]) -> Result<Vec<V>> {
        let codec = self.codec();
        self.get_all_bytes(bucket)?
            .iter()
            .map(|(_, bytes)| codec.decode(bytes))
            .collect()
    }

    /// Resolve `index_key` and decode the record it points at.
    fn get_by_index<V: DeserializeOwned>(
        &self,
        index_bucket: &[u8],
        data_bucket: &[u8],
        index_key: &[u8],
    ) -> Result<V> {
        let primary_key = self.index_target(index_bucket, index_key)?;
        self.get(data_bucket, &primary_key)
    }

    /// Decode the target of every index entry, ordered by index key.
    ///
    /// An entry whose target record is missing fails the whole call with
    /// key-missing.
    fn get_all_by_index<V: DeserializeOwned>(
        &self,
        index_bucket: &[u8],
        data_bucket: &[u8],
    ) -> Result<Vec<V>> {
        self.index_entries(index_bucket)?
            .iter()
            .map(|(_, primary_key)| self.get(data_bucket, primary_key))
            .collect()
    }
}

impl<X: Tx + ?Sized> TxExt for X {}
