//! Redb table layout.
//!
//! Redb has no nested buckets, so the bucket/record/index/sequence model is
//! laid out over four fixed tables with ordered tuple keys:
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `buckets` | bucket | bucket sequence |
//! | `record_heads` | (bucket, key) | latest version number |
//! | `record_versions` | (bucket, key, version) | snapshot bytes |
//! | `index_entries` | (index bucket, index key) | primary key |
//!
//! Tuple keys compare element by element, so all entries of one bucket are
//! contiguous and sorted by key. The bucket sequence and the per-record
//! version numbers live in different tables and never share state.

use redb::{
    ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition, WriteTransaction,
};
use regstore_core::{Error, Result};

/// `(bucket, key)`
pub(crate) type RecordKey = (&'static [u8], &'static [u8]);

/// `(bucket, key, version)`
pub(crate) type VersionKey = (&'static [u8], &'static [u8], u64);

pub(crate) const BUCKETS: TableDefinition<'static, &'static [u8], u64> =
    TableDefinition::new("buckets");

pub(crate) const HEADS: TableDefinition<'static, RecordKey, u64> =
    TableDefinition::new("record_heads");

pub(crate) const VERSIONS: TableDefinition<'static, VersionKey, &'static [u8]> =
    TableDefinition::new("record_versions");

pub(crate) const INDEXES: TableDefinition<'static, RecordKey, &'static [u8]> =
    TableDefinition::new("index_entries");

/// Smallest key; `(bucket, EMPTY)..` starts a scan at the bucket's first entry.
const EMPTY: &[u8] = &[];

/// Convert any redb error into a generic storage error.
pub(crate) fn engine_err(e: impl Into<redb::Error>) -> Error {
    Error::Storage(e.into().to_string())
}

/// The four tables, opened in one transaction.
pub(crate) struct Tables<B, H, V, I> {
    buckets: B,
    heads: H,
    versions: V,
    indexes: I,
}

pub(crate) type ReadTables = Tables<
    ReadOnlyTable<&'static [u8], u64>,
    ReadOnlyTable<RecordKey, u64>,
    ReadOnlyTable<VersionKey, &'static [u8]>,
    ReadOnlyTable<RecordKey, &'static [u8]>,
>;

pub(crate) type WriteTables<'txn> = Tables<
    Table<'txn, &'static [u8], u64>,
    Table<'txn, RecordKey, u64>,
    Table<'txn, VersionKey, &'static [u8]>,
    Table<'txn, RecordKey, &'static [u8]>,
>;

pub(crate) fn open_read(txn: &ReadTransaction) -> Result<ReadTables> {
    Ok(Tables {
        buckets: txn.open_table(BUCKETS).map_err(engine_err)?,
        heads: txn.open_table(HEADS).map_err(engine_err)?,
        versions: txn.open_table(VERSIONS).map_err(engine_err)?,
        indexes: txn.open_table(INDEXES).map_err(engine_err)?,
    })
}

pub(crate) fn open_write(txn: &WriteTransaction) -> Result<WriteTables<'_>> {
    Ok(Tables {
        buckets: txn.open_table(BUCKETS).map_err(engine_err)?,
        heads: txn.open_table(HEADS).map_err(engine_err)?,
        versions: txn.open_table(VERSIONS).map_err(engine_err)?,
        indexes: txn.open_table(INDEXES).map_err(engine_err)?,
    })
}

// ============================================================================
// Reads (both transaction kinds)
// ============================================================================

impl<B, H, V, I> Tables<B, H, V, I>
where
    B: ReadableTable<&'static [u8], u64>,
    H: ReadableTable<RecordKey, u64>,
    V: ReadableTable<VersionKey, &'static [u8]>,
    I: ReadableTable<RecordKey, &'static [u8]>,
{
    /// Current bucket sequence; fails if the bucket was never created.
    pub(crate) fn sequence(&self, bucket: &[u8]) -> Result<u64> {
        self.buckets
            .get(bucket)
            .map_err(engine_err)?
            .map(|guard| guard.value())
            .ok_or_else(|| Error::bucket_not_found(bucket))
    }

    /// Latest version number of a record, if it has a chain.
    pub(crate) fn head(&self, bucket: &[u8], key: &[u8]) -> Result<Option<u64>> {
        Ok(self
            .heads
            .get((bucket, key))
            .map_err(engine_err)?
            .map(|guard| guard.value()))
    }

    fn snapshot(&self, bucket: &[u8], key: &[u8], version: u64) -> Result<Vec<u8>> {
        let guard = self
            .versions
            .get((bucket, key, version))
            .map_err(engine_err)?
            .ok_or_else(|| {
                Error::Storage(format!(
                    "version {} of {}/{} is missing",
                    version,
                    String::from_utf8_lossy(bucket),
                    String::from_utf8_lossy(key)
                ))
            })?;
        Ok(guard.value().to_vec())
    }

    pub(crate) fn latest(&self, bucket: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.sequence(bucket)?;
        let head = self
            .head(bucket, key)?
            .ok_or_else(|| Error::key_not_found(bucket, key))?;
        self.snapshot(bucket, key, head)
    }

    pub(crate) fn records(&self, bucket: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.sequence(bucket)?;
        let mut out = Vec::new();
        for entry in self.heads.range((bucket, EMPTY)..).map_err(engine_err)? {
            let (k, v) = entry.map_err(engine_err)?;
            let (owner, key) = k.value();
            if owner != bucket {
                break;
            }
            out.push((key.to_vec(), self.snapshot(bucket, key, v.value())?));
        }
        Ok(out)
    }

    pub(crate) fn index_target(&self, index_bucket: &[u8], index_key: &[u8]) -> Result<Vec<u8>> {
        self.sequence(index_bucket)?;
        self.indexes
            .get((index_bucket, index_key))
            .map_err(engine_err)?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| Error::key_not_found(index_bucket, index_key))
    }

    pub(crate) fn index_entries(&self, index_bucket: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.sequence(index_bucket)?;
        let mut out = Vec::new();
        for entry in self.indexes.range((index_bucket, EMPTY)..).map_err(engine_err)? {
            let (k, v) = entry.map_err(engine_err)?;
            let (owner, index_key) = k.value();
            if owner != index_bucket {
                break;
            }
            out.push((index_key.to_vec(), v.value().to_vec()));
        }
        Ok(out)
    }
}

// ============================================================================
// Writes
// ============================================================================

impl WriteTables<'_> {
    /// Returns true if the bucket was created by this call.
    pub(crate) fn create_bucket(&mut self, bucket: &[u8]) -> Result<bool> {
        let exists = self.buckets.get(bucket).map_err(engine_err)?.is_some();
        if exists {
            return Ok(false);
        }
        self.buckets.insert(bucket, 0u64).map_err(engine_err)?;
        Ok(true)
    }

    pub(crate) fn next_sequence(&mut self, bucket: &[u8]) -> Result<u64> {
        let next = self.sequence(bucket)? + 1;
        self.buckets.insert(bucket, next).map_err(engine_err)?;
        Ok(next)
    }

    pub(crate) fn insert_record(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
        self.sequence(bucket)?;
        if self.head(bucket, key)?.is_some() {
            return Err(Error::key_exists(bucket, key));
        }
        self.append(bucket, key, 1, value)
    }

    pub(crate) fn update_record(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
        self.sequence(bucket)?;
        let head = self
            .head(bucket, key)?
            .ok_or_else(|| Error::key_not_found(bucket, key))?;
        self.append(bucket, key, head + 1, value)
    }

    fn append(&mut self, bucket: &[u8], key: &[u8], version: u64, value: &[u8]) -> Result<()> {
        self.versions
            .insert((bucket, key, version), value)
            .map_err(engine_err)?;
        self.heads.insert((bucket, key), version).map_err(engine_err)?;
        Ok(())
    }

    pub(crate) fn add_index(
        &mut self,
        index_bucket: &[u8],
        index_key: &[u8],
        primary_key: &[u8],
    ) -> Result<()> {
        self.sequence(index_bucket)?;
        let exists = self
            .indexes
            .get((index_bucket, index_key))
            .map_err(engine_err)?
            .is_some();
        if exists {
            return Err(Error::key_exists(index_bucket, index_key));
        }
        self.indexes
            .insert((index_bucket, index_key), primary_key)
            .map_err(engine_err)?;
        Ok(())
    }

    /// Returns the number of entries removed.
    pub(crate) fn remove_index_target(
        &mut self,
        index_bucket: &[u8],
        primary_key: &[u8],
    ) -> Result<usize> {
        let doomed: Vec<Vec<u8>> = self
            .index_entries(index_bucket)?
            .into_iter()
            .filter(|(_, target)| target.as_slice() == primary_key)
            .map(|(index_key, _)| index_key)
            .collect();
        for index_key in &doomed {
            self.indexes
                .remove((index_bucket, index_key.as_slice()))
                .map_err(engine_err)?;
        }
        Ok(doomed.len())
    }
}
