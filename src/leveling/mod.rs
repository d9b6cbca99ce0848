//! Leveling engine: experience thresholds, level records and level-up events
//!
//! # Architecture
//!
//! ```text
//!   stats source ──► ActivityLedger ──► LevelStore (memory / SQLite)
//!                        │    │
//!                        │    └──► LevelUpObserver ──► subscribers (UI)
//!                        ▼
//!                    LevelTable  ◄── LevelingConfig (tiers, weights)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let bus = LevelUpBus::default();
//! let ledger = ActivityLedger::new(MemoryStore::new(), &LevelingConfig::default(), Arc::new(bus.clone()));
//!
//! let outcome = ledger.recompute_from_stats(user_id, fresh_stats)?;
//! let granted = ledger.check_achievements(user_id)?;
//! ```

mod checker;
mod db;
mod events;
mod ledger;
pub mod levels;
mod models;
mod store;

pub use checker::check_achievements;
pub use db::SqliteStore;
pub use events::{LevelUpBus, LevelUpEvent, LevelUpObserver};
pub use ledger::ActivityLedger;
pub use levels::{exp_from_stats, generate_thresholds, LevelTable, MAX_EXP, MAX_LEVEL, MIN_LEVEL};
pub use models::{ActivityKind, ActivityStats, LevelProgress, RecomputeOutcome, UserLevelRecord};
pub use store::{LevelStore, MemoryStore};
