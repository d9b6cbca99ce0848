//! CLI command implementations

pub mod admin;
pub mod init;
pub mod table;
pub mod user;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use lounge_level::{ActivityLedger, LevelUpObserver, LevelingConfig, SqliteStore};

/// Open the ledger over the SQLite database at `db_path`
pub fn open_ledger(
    config: &LevelingConfig,
    db_path: &Path,
    observer: Arc<dyn LevelUpObserver>,
) -> Result<ActivityLedger<SqliteStore>> {
    let store = SqliteStore::open(db_path)?;
    tracing::debug!(db = %db_path.display(), "Opened level database");
    Ok(ActivityLedger::new(store, config, observer))
}
