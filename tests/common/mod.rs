//! Shared utilities for integration tests.

#![allow(dead_code)]

use regstore::{DurabilityMode, DurableConfig, DurableDb, MemoryDb};
use serde::{Deserialize, Serialize};
use std::sync::Once;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// A database plus whatever must outlive it.
pub struct Fixture<D> {
    pub db: D,
    _dir: Option<TempDir>,
}

/// Fresh in-memory backend.
pub fn memory() -> Fixture<MemoryDb> {
    Fixture {
        db: MemoryDb::new(),
        _dir: None,
    }
}

/// Fresh durable backend in a temp directory.
pub fn durable() -> Fixture<DurableDb> {
    let dir = TempDir::new().expect("create temp dir");
    let config = DurableConfig {
        durability: DurabilityMode::None,
        ..DurableConfig::default()
    };
    let db = DurableDb::open_with_config(dir.path().join("records.redb"), config)
        .expect("open durable db");
    Fixture {
        db,
        _dir: Some(dir),
    }
}

/// Fresh durable backend with no backing file.
pub fn ephemeral() -> Fixture<DurableDb> {
    Fixture {
        db: DurableDb::in_memory().expect("open in-memory durable db"),
        _dir: None,
    }
}

/// Minimal record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestData {
    pub i: i64,
}

pub fn data(i: i64) -> TestData {
    TestData { i }
}
