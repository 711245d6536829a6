//! Transactions over the durable backend.
//!
//! A [`DurableTx`] wraps either a redb read transaction (a snapshot taken when
//! `view` starts) or the single redb write transaction. Tables are opened per
//! operation and dropped before the call returns, so the write transaction can
//! always be committed or aborted afterwards.

use crate::tables::{engine_err, open_read, open_write};
use redb::{ReadTransaction, WriteTransaction};
use regstore_core::{Codec, Error, Result, Tx};
use tracing::debug;

pub(crate) enum Inner {
    Read(ReadTransaction),
    Write(WriteTransaction),
}

/// Runs `$body` with `$tables` bound to the tables of either transaction kind.
macro_rules! with_tables {
    ($inner:expr, |$tables:ident| $body:expr) => {
        match $inner {
            Inner::Read(txn) => {
                let $tables = open_read(txn)?;
                $body
            }
            Inner::Write(txn) => {
                let $tables = open_write(txn)?;
                $body
            }
        }
    };
}

/// A transaction over a [`DurableDb`](crate::DurableDb).
pub struct DurableTx {
    inner: Inner,
    codec: Codec,
}

impl DurableTx {
    pub(crate) fn read(txn: ReadTransaction, codec: Codec) -> Self {
        Self {
            inner: Inner::Read(txn),
            codec,
        }
    }

    pub(crate) fn write(txn: WriteTransaction, codec: Codec) -> Self {
        Self {
            inner: Inner::Write(txn),
            codec,
        }
    }

    /// Make every write of this transaction durable. No-op for reads.
    pub(crate) fn commit(self) -> Result<()> {
        match self.inner {
            Inner::Write(txn) => {
                txn.commit().map_err(engine_err)?;
                debug!("durable transaction committed");
                Ok(())
            }
            Inner::Read(_) => Ok(()),
        }
    }

    /// Discard every write of this transaction. No-op for reads.
    pub(crate) fn abort(self) -> Result<()> {
        match self.inner {
            Inner::Write(txn) => txn.abort().map_err(engine_err),
            Inner::Read(_) => Ok(()),
        }
    }

    fn writer(&self, operation: &'static str) -> Result<&WriteTransaction> {
        match &self.inner {
            Inner::Write(txn) => Ok(txn),
            Inner::Read(_) => Err(Error::not_writable(operation)),
        }
    }
}

impl Tx for DurableTx {
    fn is_writable(&self) -> bool {
        matches!(self.inner, Inner::Write(_))
    }

    fn codec(&self) -> Codec {
        self.codec
    }

    fn create_bucket_if_not_exists(&mut self, bucket: &[u8]) -> Result<()> {
        let mut tables = open_write(self.writer("create bucket")?)?;
        if tables.create_bucket(bucket)? {
            debug!(bucket = %String::from_utf8_lossy(bucket), "bucket created");
        }
        Ok(())
    }

    fn insert_bytes(&mut self, bucket: &[u8], key: &[u8], value: Vec<u8>) -> Result<()> {
        let mut tables = open_write(self.writer("insert record")?)?;
        tables.insert_record(bucket, key, &value)
    }

    fn update_bytes(&mut self, bucket: &[u8], key: &[u8], value: Vec<u8>) -> Result<()> {
        let mut tables = open_write(self.writer("update record")?)?;
        tables.update_record(bucket, key, &value)
    }

    fn get_bytes(&self, bucket: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        with_tables!(&self.inner, |tables| tables.latest(bucket, key))
    }

    fn get_all_bytes(&self, bucket: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        with_tables!(&self.inner, |tables| tables.records(bucket))
    }

    fn add_index(
        &mut self,
        index_bucket: &[u8],
        index_key: &[u8],
        primary_key: &[u8],
    ) -> Result<()> {
        let mut tables = open_write(self.writer("add index")?)?;
        tables.add_index(index_bucket, index_key, primary_key)
    }

    fn index_target(&self, index_bucket: &[u8], index_key: &[u8]) -> Result<Vec<u8>> {
        with_tables!(&self.inner, |tables| tables
            .index_target(index_bucket, index_key))
    }

    fn index_entries(&self, index_bucket: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        with_tables!(&self.inner, |tables| tables.index_entries(index_bucket))
    }

    fn remove_key_from_index(&mut self, index_bucket: &[u8], primary_key: &[u8]) -> Result<()> {
        let mut tables = open_write(self.writer("remove index entry")?)?;
        let removed = tables.remove_index_target(index_bucket, primary_key)?;
        debug!(removed, "index entries removed");
        Ok(())
    }

    fn next_sequence_for_bucket(&mut self, bucket: &[u8]) -> Result<u64> {
        let mut tables = open_write(self.writer("advance sequence")?)?;
        tables.next_sequence(bucket)
    }
}
