//! Shared test utilities for ledger integration tests

use std::sync::Arc;

use lounge_level::{ActivityLedger, LevelUpBus, LevelingConfig, SqliteStore};
use tempfile::TempDir;

/// Ledger over a SQLite database in a fresh temp dir, plus its event bus.
/// Keep the `TempDir` alive for the duration of the test.
pub fn temp_ledger(config: &LevelingConfig) -> (TempDir, ActivityLedger<SqliteStore>, LevelUpBus) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(&temp_dir.path().join("levels.db")).expect("Failed to open db");
    let bus = LevelUpBus::default();
    let ledger = ActivityLedger::new(store, config, Arc::new(bus.clone()));
    (temp_dir, ledger, bus)
}
