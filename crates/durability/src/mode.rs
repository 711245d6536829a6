//! Durability mode for commits.
//!
//! Defines when a committed transaction is guaranteed to be on disk.

use serde::{Deserialize, Serialize};

/// Durability mode for write transactions.
///
/// Controls whether a commit waits for fsync, trading latency for the
/// window of data that can be lost on crash.
///
/// # Mode Comparison
///
/// | Mode | fsync on commit | Use Case |
/// |------|-----------------|----------|
/// | None | Never | Tests, scratch data |
/// | Eventual | Deferred | Bulk loads |
/// | Strict | Always | Production (default) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityMode {
    /// No durability - commits are not persisted until a later durable commit.
    ///
    /// Use case: tests, throwaway files.
    None,

    /// Commits are persisted eventually; a crash may lose the most recent ones.
    Eventual,

    /// fsync before every commit returns. No committed data is lost on crash.
    #[default]
    Strict,
}

impl DurabilityMode {
    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No durability (fastest, recent commits lost on crash)",
            DurabilityMode::Eventual => "Deferred fsync (fast, bounded loss on crash)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
        }
    }

    pub(crate) fn to_redb(self) -> redb::Durability {
        match self {
            DurabilityMode::None => redb::Durability::None,
            DurabilityMode::Eventual => redb::Durability::Eventual,
            DurabilityMode::Strict => redb::Durability::Immediate,
        }
    }
}
