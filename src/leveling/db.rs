//! SQLite-backed level record storage
//!
//! Manages the `~/.lounge-level/levels.db` database with automatic schema migration.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use super::models::{ActivityStats, UserLevelRecord};
use super::store::LevelStore;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS user_levels (
    user_id INTEGER PRIMARY KEY,
    current_exp INTEGER NOT NULL DEFAULT 0,
    level INTEGER NOT NULL DEFAULT 1,
    last_level_up INTEGER,              -- unix millis, NULL if never leveled up
    achievements TEXT NOT NULL DEFAULT '[]',  -- JSON array of ids
    total_likes INTEGER NOT NULL DEFAULT 0,
    story_promotions INTEGER NOT NULL DEFAULT 0,
    total_bookmarks INTEGER NOT NULL DEFAULT 0,
    total_posts INTEGER NOT NULL DEFAULT 0,
    total_comments INTEGER NOT NULL DEFAULT 0,
    excellent_posts INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;

const SELECT_COLUMNS: &str = "user_id, current_exp, level, last_level_up, achievements, \
     total_likes, story_promotions, total_bookmarks, total_posts, total_comments, excellent_posts";

// SQLite integers are signed 64-bit; u64 values are stored by bit pattern
fn to_column(value: u64) -> i64 {
    value as i64
}

fn from_column(value: i64) -> u64 {
    value as u64
}

/// Level records in a SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open level db: {}", path.display()))?;

        // WAL lets the admin CLI read while a service writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::with_connection(conn)
    }

    /// Database that lives only as long as the store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory level db")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to create level schema")?;

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Migration 2: index for leaderboard ordering
        if version < 2 {
            conn.execute_batch(
                r#"
                CREATE INDEX IF NOT EXISTS idx_user_levels_exp ON user_levels(current_exp DESC);
                INSERT OR REPLACE INTO schema_version VALUES (2);
                "#,
            )?;
        }

        Ok(())
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        let version = conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?;
        Ok(version)
    }
}

/// Raw column values, decoded outside the rusqlite row callback so JSON
/// errors surface through anyhow.
struct RawRecord {
    user_id: u64,
    current_exp: u64,
    level: u32,
    last_level_up: Option<i64>,
    achievements: String,
    stats: ActivityStats,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: from_column(row.get(0)?),
            current_exp: from_column(row.get(1)?),
            level: row.get(2)?,
            last_level_up: row.get(3)?,
            achievements: row.get(4)?,
            stats: ActivityStats {
                total_likes: from_column(row.get(5)?),
                story_promotions: from_column(row.get(6)?),
                total_bookmarks: from_column(row.get(7)?),
                total_posts: from_column(row.get(8)?),
                total_comments: from_column(row.get(9)?),
                excellent_posts: from_column(row.get(10)?),
            },
        })
    }

    fn decode(self) -> Result<UserLevelRecord> {
        let achievements: Vec<String> = serde_json::from_str(&self.achievements)
            .with_context(|| format!("Corrupt achievements for user {}", self.user_id))?;

        Ok(UserLevelRecord {
            user_id: self.user_id,
            current_exp: self.current_exp,
            level: self.level,
            last_level_up: self.last_level_up.and_then(DateTime::<Utc>::from_timestamp_millis),
            achievements,
            stats: self.stats,
        })
    }
}

impl LevelStore for SqliteStore {
    fn load(&self, user_id: u64) -> Result<Option<UserLevelRecord>> {
        let conn = self.conn();
        let raw = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM user_levels WHERE user_id = ?1"),
                [to_column(user_id)],
                RawRecord::from_row,
            )
            .optional()
            .with_context(|| format!("Failed to load level record for user {user_id}"))?;
        drop(conn);

        raw.map(RawRecord::decode).transpose()
    }

    fn save(&self, record: &UserLevelRecord) -> Result<()> {
        let achievements = serde_json::to_string(&record.achievements)?;
        let now = Utc::now().timestamp_millis();

        let conn = self.conn();
        conn.execute(
            r#"INSERT OR REPLACE INTO user_levels
               (user_id, current_exp, level, last_level_up, achievements,
                total_likes, story_promotions, total_bookmarks, total_posts,
                total_comments, excellent_posts, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            rusqlite::params![
                to_column(record.user_id),
                to_column(record.current_exp),
                record.level,
                record.last_level_up.map(|t| t.timestamp_millis()),
                achievements,
                to_column(record.stats.total_likes),
                to_column(record.stats.story_promotions),
                to_column(record.stats.total_bookmarks),
                to_column(record.stats.total_posts),
                to_column(record.stats.total_comments),
                to_column(record.stats.excellent_posts),
                now,
            ],
        )
        .with_context(|| format!("Failed to save level record for user {}", record.user_id))?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<UserLevelRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_levels ORDER BY current_exp DESC, user_id ASC"
        ))?;
        let raws: Vec<RawRecord> = stmt
            .query_map([], RawRecord::from_row)?
            .collect::<rusqlite::Result<_>>()?;
        drop(stmt);
        drop(conn);

        let mut records = Vec::with_capacity(raws.len());
        for raw in raws {
            let user_id = raw.user_id;
            match raw.decode() {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(user_id, error = %e, "Skipping undecodable level record"),
            }
        }
        Ok(records)
    }

    fn reset_all(&self) -> Result<usize> {
        let now = Utc::now().timestamp_millis();
        let conn = self.conn();
        let count = conn.execute(
            r#"UPDATE user_levels SET
                current_exp = 0, level = 1, last_level_up = NULL, achievements = '[]',
                total_likes = 0, story_promotions = 0, total_bookmarks = 0,
                total_posts = 0, total_comments = 0, excellent_posts = 0,
                updated_at = ?1"#,
            [now],
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> UserLevelRecord {
        UserLevelRecord {
            user_id: 42,
            current_exp: 130,
            level: 11,
            last_level_up: DateTime::<Utc>::from_timestamp_millis(1_760_000_000_000),
            achievements: vec!["first_post".to_string(), "first_like".to_string()],
            stats: ActivityStats {
                total_likes: 20,
                story_promotions: 1,
                total_bookmarks: 4,
                total_posts: 12,
                total_comments: 36,
                excellent_posts: 2,
            },
        }
    }

    #[test]
    fn test_schema_is_migrated() {
        let store = SqliteStore::open_in_memory().expect("open");
        assert_eq!(store.schema_version().expect("version"), 2);
    }

    #[test]
    fn test_save_and_load_record() {
        let store = SqliteStore::open_in_memory().expect("open");
        let record = sample_record();
        store.save(&record).expect("save");

        assert_eq!(store.load(42).expect("load"), Some(record));
        assert_eq!(store.load(7).expect("load"), None);
    }

    #[test]
    fn test_all_orders_by_exp() {
        let store = SqliteStore::open_in_memory().expect("open");
        let mut low = UserLevelRecord::new(1);
        low.current_exp = 10;
        store.save(&low).expect("save");
        store.save(&sample_record()).expect("save");

        let ids: Vec<u64> = store.all().expect("all").iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![42, 1]);
    }

    #[test]
    fn test_full_u64_range_round_trips() {
        let store = SqliteStore::open_in_memory().expect("open");
        let mut record = UserLevelRecord::new(u64::MAX);
        record.current_exp = u64::MAX;
        record.stats.total_likes = 1 << 63;
        record.stats.excellent_posts = u64::MAX;
        store.save(&record).expect("save");

        assert_eq!(store.load(u64::MAX).expect("load"), Some(record));
        assert_eq!(store.load(1 << 63).expect("load"), None);
    }

    #[test]
    fn test_reset_all_clears_history() {
        let store = SqliteStore::open_in_memory().expect("open");
        store.save(&sample_record()).expect("save");

        assert_eq!(store.reset_all().expect("reset"), 1);
        assert_eq!(store.load(42).expect("load"), Some(UserLevelRecord::new(42)));
    }
}
