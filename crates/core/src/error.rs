//! Error types for regstore.
//!
//! Every failure raised by a backend is a variant of [`Error`]. Callers should
//! branch on [`Error::kind`], which folds the variants into the four classes
//! of [`ErrorKind`], rather than on message text.
//!
//! | Kind | Variants | Typical caller reaction |
//! |------|----------|-------------------------|
//! | `Generic` | Codec, Storage, Io, Config, BucketNotFound, LockTimeout | Fatal to the transaction |
//! | `KeyAlreadyExists` | KeyExists | "already registered" |
//! | `KeyDoesNotExist` | KeyNotFound | 404 |
//! | `TxNotWritable` | NotWritable | Programming error |

use std::fmt;
use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of an [`Error`].
///
/// This set is closed: every error maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Codec failures, engine I/O, misconfiguration, missing buckets.
    Generic,
    /// A primary key or index key was already present.
    KeyAlreadyExists,
    /// A primary key or index key was absent.
    KeyDoesNotExist,
    /// A mutating operation was attempted inside a read-only transaction.
    TxNotWritable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Generic => "generic error",
            ErrorKind::KeyAlreadyExists => "key already exists",
            ErrorKind::KeyDoesNotExist => "key does not exist",
            ErrorKind::TxNotWritable => "transaction not writable",
        };
        f.write_str(name)
    }
}

/// All storage errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The underlying engine reported a failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The bucket was never created.
    #[error("bucket not found: {bucket}")]
    BucketNotFound {
        /// Bucket name (lossy UTF-8)
        bucket: String,
    },

    /// Gave up waiting for the transaction lock.
    #[error("timed out after {waited_ms}ms waiting for transaction lock")]
    LockTimeout {
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Insert or index on a key that is already present.
    #[error("key already exists: {bucket}/{key}")]
    KeyExists {
        /// Bucket name (lossy UTF-8)
        bucket: String,
        /// Key (lossy UTF-8)
        key: String,
    },

    /// Lookup or update on a key that is absent.
    #[error("key does not exist: {bucket}/{key}")]
    KeyNotFound {
        /// Bucket name (lossy UTF-8)
        bucket: String,
        /// Key (lossy UTF-8)
        key: String,
    },

    /// Mutation inside a read-only transaction.
    #[error("transaction not writable: could not {operation}")]
    NotWritable {
        /// The rejected operation
        operation: &'static str,
    },
}

impl Error {
    /// Missing bucket error.
    pub fn bucket_not_found(bucket: &[u8]) -> Self {
        Error::BucketNotFound {
            bucket: lossy(bucket),
        }
    }

    /// Duplicate key error.
    pub fn key_exists(bucket: &[u8], key: &[u8]) -> Self {
        Error::KeyExists {
            bucket: lossy(bucket),
            key: lossy(key),
        }
    }

    /// Missing key error.
    pub fn key_not_found(bucket: &[u8], key: &[u8]) -> Self {
        Error::KeyNotFound {
            bucket: lossy(bucket),
            key: lossy(key),
        }
    }

    /// Read-only rejection for `operation`.
    pub fn not_writable(operation: &'static str) -> Self {
        Error::NotWritable { operation }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Codec(_)
            | Error::Storage(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::BucketNotFound { .. }
            | Error::LockTimeout { .. } => ErrorKind::Generic,
            Error::KeyExists { .. } => ErrorKind::KeyAlreadyExists,
            Error::KeyNotFound { .. } => ErrorKind::KeyDoesNotExist,
            Error::NotWritable { .. } => ErrorKind::TxNotWritable,
        }
    }

    /// Check if this is a duplicate-key error.
    pub fn is_key_exists(&self) -> bool {
        self.kind() == ErrorKind::KeyAlreadyExists
    }

    /// Check if this is a missing-key error.
    pub fn is_key_not_found(&self) -> bool {
        self.kind() == ErrorKind::KeyDoesNotExist
    }

    /// Check if this is a read-only rejection.
    pub fn is_not_writable(&self) -> bool {
        self.kind() == ErrorKind::TxNotWritable
    }

    /// Check if this is a generic (usually unrecoverable) failure.
    pub fn is_generic(&self) -> bool {
        self.kind() == ErrorKind::Generic
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
