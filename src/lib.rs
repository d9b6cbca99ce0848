//! Lounge Level - experience and level engine for the Lounge community
//!
//! Members earn experience from weighted activity (posts, comments, likes
//! received, promoted stories, bookmarks, excellent-post flags). A tiered
//! ladder with geometric growth turns experience into a level from 1 to 99.
//!
//! ## Components
//!
//! 1. **[`LevelTable`]**: pure threshold table built from the tier config.
//! 2. **[`ActivityLedger`]**: per-user records recomputed from authoritative
//!    stats, with achievements and level-up notifications.

pub mod config;
pub mod leveling;

pub use config::{ConfigError, LevelPolicy, LevelingConfig};
pub use leveling::{
    ActivityKind, ActivityLedger, ActivityStats, LevelProgress, LevelStore, LevelTable,
    LevelUpBus, LevelUpEvent, LevelUpObserver, MemoryStore, RecomputeOutcome, SqliteStore,
    UserLevelRecord,
};
