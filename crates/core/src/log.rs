//! Append-only version chain for a single record.
//!
//! Every insert starts a chain and every update appends to it. Only the last
//! entry is live. Version numbers start at 1 and are private to the record;
//! they never share state with a bucket's sequence counter.

/// Per-record version chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLog {
    entries: Vec<Vec<u8>>,
}

impl VersionLog {
    /// Start a chain with its first version.
    pub fn start(first: Vec<u8>) -> Self {
        Self {
            entries: vec![first],
        }
    }

    /// Append a new latest version and return its number.
    pub fn append(&mut self, snapshot: Vec<u8>) -> u64 {
        self.entries.push(snapshot);
        self.head()
    }

    /// The live snapshot.
    pub fn latest(&self) -> &[u8] {
        // `start` is the only constructor, so there is always an entry.
        &self.entries[self.entries.len() - 1]
    }

    /// Number of the live version.
    pub fn head(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Drop the live version, making the previous one live again.
    ///
    /// The first version is never dropped; returns `None` if it is the only one.
    pub fn retract_latest(&mut self) -> Option<Vec<u8>> {
        if self.entries.len() > 1 {
            self.entries.pop()
        } else {
            None
        }
    }

    /// Number of versions retained.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true for a started chain.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
