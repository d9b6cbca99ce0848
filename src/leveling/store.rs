//! Persistence boundary for level records

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use super::models::UserLevelRecord;

/// Storage for per-user level records.
///
/// A single `load` + `save` pair is not atomic. Callers that can see
/// concurrent updates for the same user must serialize them.
pub trait LevelStore: Send + Sync {
    fn load(&self, user_id: u64) -> Result<Option<UserLevelRecord>>;

    fn save(&self, record: &UserLevelRecord) -> Result<()>;

    /// Every stored record, in no particular order
    fn all(&self) -> Result<Vec<UserLevelRecord>>;

    /// Overwrite every stored record with a default one. Returns how many
    /// records were reset.
    fn reset_all(&self) -> Result<usize>;
}

/// In-process store, used for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<u64, UserLevelRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<u64, UserLevelRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LevelStore for MemoryStore {
    fn load(&self, user_id: u64) -> Result<Option<UserLevelRecord>> {
        Ok(self.records().get(&user_id).cloned())
    }

    fn save(&self, record: &UserLevelRecord) -> Result<()> {
        self.records().insert(record.user_id, record.clone());
        Ok(())
    }

    fn all(&self) -> Result<Vec<UserLevelRecord>> {
        Ok(self.records().values().cloned().collect())
    }

    fn reset_all(&self) -> Result<usize> {
        let mut records = self.records();
        for (user_id, record) in records.iter_mut() {
            *record = UserLevelRecord::new(*user_id);
        }
        Ok(records.len())
    }
}
