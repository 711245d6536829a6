//! In-memory backend
//!
//! A pure-memory implementation of the storage contract, used as a fast test
//! double and as a drop-in substitute for the durable backend.
//!
//! # Design
//!
//! - One FxHashMap of buckets, each holding records, index entries and a
//!   sequence counter
//! - Enumerations sort explicitly, so results come back in key order exactly
//!   like the durable backend
//! - A single exclusive lock owned by the instance serializes ALL
//!   transactions, `view`s included. Concurrent readers block each other.
//! - `update` mutates the live map in place and journals an undo step for
//!   every change. Commit discards the journal. Rollback (an `Err` from the
//!   closure, or a panic inside it) replays it in reverse. The cost of a
//!   rollback is proportional to the writes made, not to the data stored.
//!
//! # Example
//!
//! ```ignore
//! use regstore_core::{Db, TxExt};
//! use regstore_storage::MemoryDb;
//!
//! let db = MemoryDb::new();
//! db.update(|tx| tx.create_bucket_if_not_exists(b"groups"))?;
//! ```

use parking_lot::{Mutex, MutexGuard};
use regstore_core::{Codec, Db, Error, Result, Tx, VersionLog};
use rustc_hash::FxHashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Contents of one bucket.
#[derive(Debug, Default)]
pub(crate) struct BucketData {
    /// Primary key -> version chain
    pub(crate) records: FxHashMap<Vec<u8>, VersionLog>,
    /// Index key -> primary key
    pub(crate) index: FxHashMap<Vec<u8>, Vec<u8>>,
    /// Last value handed out by `next_sequence_for_bucket`
    pub(crate) sequence: u64,
}

type Buckets = FxHashMap<Vec<u8>, BucketData>;

fn bucket_mut<'b>(buckets: &'b mut Buckets, name: &[u8]) -> Result<&'b mut BucketData> {
    buckets
        .get_mut(name)
        .ok_or_else(|| Error::bucket_not_found(name))
}

// ============================================================================
// Undo journal
// ============================================================================

/// Inverse of one mutation made by a writable transaction.
#[derive(Debug)]
enum Undo {
    CreateBucket {
        bucket: Vec<u8>,
    },
    Insert {
        bucket: Vec<u8>,
        key: Vec<u8>,
    },
    Append {
        bucket: Vec<u8>,
        key: Vec<u8>,
    },
    AddIndex {
        bucket: Vec<u8>,
        index_key: Vec<u8>,
    },
    RemoveIndex {
        bucket: Vec<u8>,
        index_key: Vec<u8>,
        target: Vec<u8>,
    },
    Sequence {
        bucket: Vec<u8>,
    },
}

impl Undo {
    /// Must be applied in reverse journal order.
    fn revert(self, buckets: &mut Buckets) {
        match self {
            Undo::CreateBucket { bucket } => {
                buckets.remove(&bucket);
            }
            Undo::Insert { bucket, key } => {
                if let Some(data) = buckets.get_mut(&bucket) {
                    data.records.remove(&key);
                }
            }
            Undo::Append { bucket, key } => {
                if let Some(log) = buckets
                    .get_mut(&bucket)
                    .and_then(|data| data.records.get_mut(&key))
                {
                    log.retract_latest();
                }
            }
            Undo::AddIndex { bucket, index_key } => {
                if let Some(data) = buckets.get_mut(&bucket) {
                    data.index.remove(&index_key);
                }
            }
            Undo::RemoveIndex {
                bucket,
                index_key,
                target,
            } => {
                if let Some(data) = buckets.get_mut(&bucket) {
                    data.index.insert(index_key, target);
                }
            }
            Undo::Sequence { bucket } => {
                if let Some(data) = buckets.get_mut(&bucket) {
                    data.sequence -= 1;
                }
            }
        }
    }
}

// ============================================================================
// Database
// ============================================================================

/// In-memory database.
///
/// # Thread Safety
///
/// `MemoryDb` is `Send + Sync`. Every transaction holds the instance lock
/// for its whole duration, so at most one transaction of any kind runs at a
/// time. Use [`MemoryDb::with_lock_timeout`] to bound how long a caller
/// waits for it.
pub struct MemoryDb {
    /// Live bucket map, guarded by the transaction lock
    state: Mutex<Buckets>,
    codec: Codec,
    lock_timeout: Option<Duration>,
}

impl MemoryDb {
    /// Create an empty database using the default codec.
    pub fn new() -> Self {
        Self::with_codec(Codec::default())
    }

    /// Create an empty database that encodes records with `codec`.
    pub fn with_codec(codec: Codec) -> Self {
        Self {
            state: Mutex::new(Buckets::default()),
            codec,
            lock_timeout: None,
        }
    }

    /// Fail transactions that wait longer than `timeout` for the lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Codec used for typed operations.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Buckets>> {
        match self.lock_timeout {
            None => Ok(self.state.lock()),
            Some(timeout) => self.state.try_lock_for(timeout).ok_or_else(|| {
                warn!(timeout_ms = timeout.as_millis() as u64, "transaction lock timeout");
                Error::LockTimeout {
                    waited_ms: timeout.as_millis() as u64,
                }
            }),
        }
    }
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDb")
            .field("codec", &self.codec)
            .field("lock_timeout", &self.lock_timeout)
            .finish()
    }
}

impl Db for MemoryDb {
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T>,
    {
        let mut live = self.acquire()?;
        let mut tx = MemoryTx::new(&mut live, true, self.codec);

        match f(&mut tx) {
            Ok(value) => {
                let writes = tx.commit();
                debug!(writes, "memory transaction committed");
                Ok(value)
            }
            Err(e) => {
                // Dropping the transaction replays its journal.
                drop(tx);
                debug!(error = %e, "memory transaction rolled back");
                Err(e)
            }
        }
    }

    fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T>,
    {
        let mut live = self.acquire()?;
        let mut tx = MemoryTx::new(&mut live, false, self.codec);
        f(&mut tx)
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// A transaction over a [`MemoryDb`].
///
/// Dropping a writable transaction without committing reverts every change
/// it made.
pub struct MemoryTx<'a> {
    buckets: &'a mut Buckets,
    writable: bool,
    codec: Codec,
    undo: Vec<Undo>,
}

impl<'a> MemoryTx<'a> {
    fn new(buckets: &'a mut Buckets, writable: bool, codec: Codec) -> Self {
        Self {
            buckets,
            writable,
            codec,
            undo: Vec::new(),
        }
    }

    /// Keep every change. Returns the number of journaled writes.
    fn commit(mut self) -> usize {
        let writes = self.undo.len();
        self.undo.clear();
        writes
    }

    fn bucket(&self, name: &[u8]) -> Result<&BucketData> {
        self.buckets
            .get(name)
            .ok_or_else(|| Error::bucket_not_found(name))
    }

    fn check_writable(&self, operation: &'static str) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::not_writable(operation))
        }
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        while let Some(step) = self.undo.pop() {
            step.revert(self.buckets);
        }
    }
}

impl Tx for MemoryTx<'_> {
    fn is_writable(&self) -> bool {
        self.writable
    }

    fn codec(&self) -> Codec {
        self.codec
    }

    fn create_bucket_if_not_exists(&mut self, bucket: &[u8]) -> Result<()> {
        self.check_writable("create bucket")?;
        if !self.buckets.contains_key(bucket) {
            self.buckets.insert(bucket.to_vec(), BucketData::default());
            self.undo.push(Undo::CreateBucket {
                bucket: bucket.to_vec(),
            });
        }
        Ok(())
    }

    fn insert_bytes(&mut self, bucket: &[u8], key: &[u8], value: Vec<u8>) -> Result<()> {
        self.check_writable("insert record")?;
        let data = bucket_mut(self.buckets, bucket)?;
        if data.records.contains_key(key) {
            return Err(Error::key_exists(bucket, key));
        }
        data.records.insert(key.to_vec(), VersionLog::start(value));
        self.undo.push(Undo::Insert {
            bucket: bucket.to_vec(),
            key: key.to_vec(),
        });
        Ok(())
    }

    fn update_bytes(&mut self, bucket: &[u8], key: &[u8], value: Vec<u8>) -> Result<()> {
        self.check_writable("update record")?;
        let data = bucket_mut(self.buckets, bucket)?;
        let log = data
            .records
            .get_mut(key)
            .ok_or_else(|| Error::key_not_found(bucket, key))?;
        log.append(value);
        self.undo.push(Undo::Append {
            bucket: bucket.to_vec(),
            key: key.to_vec(),
        });
        Ok(())
    }

    fn get_bytes(&self, bucket: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.bucket(bucket)?
            .records
            .get(key)
            .map(|log| log.latest().to_vec())
            .ok_or_else(|| Error::key_not_found(bucket, key))
    }

    fn get_all_bytes(&self, bucket: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut results: Vec<_> = self.bucket(bucket)?
            .records
            .iter()
            .map(|(key, log)| (key.clone(), log.latest().to_vec()))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(results)
    }

    fn add_index(
        &mut self,
        index_bucket: &[u8],
        index_key: &[u8],
        primary_key: &[u8],
    ) -> Result<()> {
        self.check_writable("add index")?;
        let data = bucket_mut(self.buckets, index_bucket)?;
        if data.index.contains_key(index_key) {
            return Err(Error::key_exists(index_bucket, index_key));
        }
        data.index.insert(index_key.to_vec(), primary_key.to_vec());
        self.undo.push(Undo::AddIndex {
            bucket: index_bucket.to_vec(),
            index_key: index_key.to_vec(),
        });
        Ok(())
    }

    fn index_target(&self, index_bucket: &[u8], index_key: &[u8]) -> Result<Vec<u8>> {
        self.bucket(index_bucket)?
            .index
            .get(index_key)
            .cloned()
            .ok_or_else(|| Error::key_not_found(index_bucket, index_key))
    }

    fn index_entries(&self, index_bucket: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut entries: Vec<_> = self.bucket(index_bucket)?
            .index
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    fn remove_key_from_index(&mut self, index_bucket: &[u8], primary_key: &[u8]) -> Result<()> {
        self.check_writable("remove index entry")?;
        let data = bucket_mut(self.buckets, index_bucket)?;
        let doomed: Vec<Vec<u8>> = data
            .index
            .iter()
            .filter(|(_, target)| target.as_slice() == primary_key)
            .map(|(index_key, _)| index_key.clone())
            .collect();
        for index_key in doomed {
            if let Some(target) = data.index.remove(&index_key) {
                self.undo.push(Undo::RemoveIndex {
                    bucket: index_bucket.to_vec(),
                    index_key,
                    target,
                });
            }
        }
        Ok(())
    }

    fn next_sequence_for_bucket(&mut self, bucket: &[u8]) -> Result<u64> {
        self.check_writable("advance sequence")?;
        let data = bucket_mut(self.buckets, bucket)?;
        data.sequence += 1;
        self.undo.push(Undo::Sequence {
            bucket: bucket.to_vec(),
        });
        Ok(data.sequence)
    }
}
