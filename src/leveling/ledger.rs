//! Activity ledger - per-user level bookkeeping
//!
//! Recomputes level records from authoritative activity counts, grants
//! achievements and announces level-ups.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use anyhow::Result;
use chrono::Utc;

use super::checker::check_achievements;
use super::events::{LevelUpEvent, LevelUpObserver};
use super::levels::{exp_from_stats, LevelTable, MAX_EXP};
use super::models::{ActivityKind, ActivityStats, LevelProgress, RecomputeOutcome, UserLevelRecord};
use super::store::LevelStore;
use crate::config::{AchievementDef, ActivityWeights, LevelPolicy, LevelingConfig};

/// Configuration-derived state, swapped as a whole on reload
struct LedgerState {
    table: LevelTable,
    weights: ActivityWeights,
    achievements: Vec<AchievementDef>,
    policy: LevelPolicy,
}

impl LedgerState {
    fn from_config(config: &LevelingConfig) -> Self {
        Self {
            table: LevelTable::new(&config.tiers),
            weights: config.weights.clone(),
            achievements: config.achievements.clone(),
            policy: config.level_policy,
        }
    }

    /// Level a recompute settles on, given the stored one
    fn resolve_level(&self, old_level: u32, exp: u64) -> u32 {
        let computed = self.table.level_for_exp(exp);
        match self.policy {
            LevelPolicy::Recompute => computed,
            LevelPolicy::HighWaterMark => computed.max(old_level),
        }
    }
}

/// Owns per-user level records.
///
/// Each operation is a single read-modify-write against the store and is not
/// atomic across threads: updates for the same user must be serialized by
/// the caller.
pub struct ActivityLedger<S: LevelStore> {
    store: S,
    observer: Arc<dyn LevelUpObserver>,
    state: RwLock<LedgerState>,
}

impl<S: LevelStore> ActivityLedger<S> {
    pub fn new(store: S, config: &LevelingConfig, observer: Arc<dyn LevelUpObserver>) -> Self {
        Self {
            store,
            observer,
            state: RwLock::new(LedgerState::from_config(config)),
        }
    }

    fn state(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace weights, tiers, achievements and policy. Stored records keep
    /// their cached values until their next recompute.
    pub fn reload_config(&self, config: &LevelingConfig) {
        let fresh = LedgerState::from_config(config);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        tracing::info!(
            tiers = config.tiers.len(),
            achievements = config.achievements.len(),
            policy = ?config.level_policy,
            "Leveling configuration reloaded"
        );
    }

    /// Snapshot of the current threshold table
    pub fn level_table(&self) -> LevelTable {
        self.state().table.clone()
    }

    /// Load the user's record, creating and saving a default one on first access
    pub fn get_or_create(&self, user_id: u64) -> Result<UserLevelRecord> {
        if let Some(record) = self.store.load(user_id)? {
            return Ok(record);
        }

        let record = UserLevelRecord::new(user_id);
        self.store.save(&record)?;
        tracing::debug!(user_id, "Created level record");
        Ok(record)
    }

    /// Replace the user's stats with `fresh_stats` and re-derive exp and level.
    ///
    /// Publishes a level-up event when the level strictly increases. Under
    /// [`LevelPolicy::Recompute`] the level drops when the stats shrink.
    pub fn recompute_from_stats(
        &self,
        user_id: u64,
        fresh_stats: ActivityStats,
    ) -> Result<RecomputeOutcome> {
        let mut record = self.get_or_create(user_id)?;
        let old_level = record.level;

        {
            let state = self.state();
            record.stats = fresh_stats;
            record.current_exp = exp_from_stats(&record.stats, &state.weights);
            record.level = state.resolve_level(old_level, record.current_exp);
        }

        let event = self.stamp_level_up(&mut record, old_level);
        self.store.save(&record)?;

        tracing::debug!(
            user_id,
            exp = record.current_exp,
            old_level,
            new_level = record.level,
            "Recomputed level from stats"
        );

        if let Some(event) = &event {
            self.publish(event);
        }

        Ok(RecomputeOutcome {
            leveled_up: event.is_some(),
            new_level: event.map(|e| e.new_level),
        })
    }

    /// Add `count` units of `kind` to the stored stats and recompute
    pub fn record_activity(
        &self,
        user_id: u64,
        kind: ActivityKind,
        count: u64,
    ) -> Result<RecomputeOutcome> {
        let stats = self.get_or_create(user_id)?.stats.with_added(kind, count);
        self.recompute_from_stats(user_id, stats)
    }

    /// Administrative override: set exp directly and derive the level from it.
    ///
    /// Stats are left alone, and the next recompute overwrites this value.
    /// No level-up event is published. `exp` is capped at [`MAX_EXP`].
    pub fn set_exp_directly(&self, user_id: u64, exp: u64) -> Result<UserLevelRecord> {
        let mut record = self.get_or_create(user_id)?;
        let old_level = record.level;
        let exp = exp.min(MAX_EXP);

        record.current_exp = exp;
        record.level = self.state().table.level_for_exp(exp);
        if record.level != old_level {
            record.last_level_up = Some(Utc::now());
        }
        self.store.save(&record)?;

        tracing::info!(
            user_id,
            exp,
            old_level,
            new_level = record.level,
            "Experience set directly"
        );
        Ok(record)
    }

    /// Grant every achievement the user newly qualifies for.
    ///
    /// Each grant adds its reward straight to `current_exp`. Returns the ids
    /// granted by this call; a repeat call with unchanged stats returns none.
    pub fn check_achievements(&self, user_id: u64) -> Result<Vec<String>> {
        let mut record = self.get_or_create(user_id)?;
        let old_level = record.level;

        let granted: Vec<String> = {
            let state = self.state();
            let newly = check_achievements(&state.achievements, &record.stats, &record.achievements);
            for def in &newly {
                record.achievements.push(def.id.clone());
                record.current_exp = record.current_exp.saturating_add(def.reward).min(MAX_EXP);
                tracing::info!(
                    user_id,
                    achievement = %def.id,
                    reward = def.reward,
                    "Achievement unlocked"
                );
            }
            if !newly.is_empty() {
                record.level = state.resolve_level(old_level, record.current_exp);
            }
            newly.into_iter().map(|def| def.id.clone()).collect()
        };

        if granted.is_empty() {
            return Ok(granted);
        }

        let event = self.stamp_level_up(&mut record, old_level);
        self.store.save(&record)?;
        if let Some(event) = &event {
            self.publish(event);
        }

        Ok(granted)
    }

    /// Reset every record to level 1 with zero exp and stats, dropping
    /// level-up history and achievements. Irreversible.
    pub fn reset_all(&self) -> Result<usize> {
        let count = self.store.reset_all()?;
        tracing::info!(count, "All level records reset");
        Ok(count)
    }

    /// Where the user currently sits on the ladder
    pub fn progress(&self, user_id: u64) -> Result<LevelProgress> {
        let record = self.get_or_create(user_id)?;
        Ok(self.state().table.progress(record.current_exp))
    }

    /// Top `limit` users by exp, ties broken by lower user id
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<UserLevelRecord>> {
        let mut records = self.store.all()?;
        records.sort_by(|a, b| {
            b.current_exp
                .cmp(&a.current_exp)
                .then(a.user_id.cmp(&b.user_id))
        });
        records.truncate(limit);
        Ok(records)
    }

    /// Stamp `last_level_up` and build the event if the level rose
    fn stamp_level_up(&self, record: &mut UserLevelRecord, old_level: u32) -> Option<LevelUpEvent> {
        if record.level <= old_level {
            return None;
        }

        let now = Utc::now();
        record.last_level_up = Some(now);
        tracing::info!(
            user_id = record.user_id,
            old_level,
            new_level = record.level,
            "Level up"
        );
        Some(LevelUpEvent {
            user_id: record.user_id,
            old_level,
            new_level: record.level,
            timestamp: now,
        })
    }

    fn publish(&self, event: &LevelUpEvent) {
        // A misbehaving observer must not undo an already-saved record
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.observer.on_level_up(event)));
        if outcome.is_err() {
            tracing::warn!(user_id = event.user_id, "Level-up observer panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leveling::events::LevelUpBus;
    use crate::leveling::store::MemoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<LevelUpEvent>>,
    }

    impl LevelUpObserver for Recorder {
        fn on_level_up(&self, event: &LevelUpEvent) {
            self.events.lock().expect("lock").push(event.clone());
        }
    }

    struct Panicker;

    impl LevelUpObserver for Panicker {
        fn on_level_up(&self, _event: &LevelUpEvent) {
            panic!("observer failure");
        }
    }

    fn ledger_with(config: LevelingConfig) -> (ActivityLedger<MemoryStore>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let ledger = ActivityLedger::new(MemoryStore::new(), &config, recorder.clone());
        (ledger, recorder)
    }

    fn ledger() -> (ActivityLedger<MemoryStore>, Arc<Recorder>) {
        ledger_with(LevelingConfig::default())
    }

    fn likes(n: u64) -> ActivityStats {
        ActivityStats {
            total_likes: n,
            ..ActivityStats::default()
        }
    }

    fn events(recorder: &Recorder) -> Vec<LevelUpEvent> {
        recorder.events.lock().expect("lock").clone()
    }

    #[test]
    fn test_get_or_create_persists_default() {
        let (ledger, _) = ledger();
        let record = ledger.get_or_create(9).expect("create");
        assert_eq!(record, UserLevelRecord::new(9));
        assert_eq!(ledger.store().load(9).expect("load"), Some(record));
    }

    #[test]
    fn test_recompute_crossing_threshold_levels_up() {
        let (ledger, recorder) = ledger();
        let table = ledger.level_table();
        // Level 5 starts at 37, level 6 at 48; likes are worth 2
        assert_eq!(table.exp_required_for_level(5), 37);
        assert_eq!(table.exp_required_for_level(6), 48);

        ledger.recompute_from_stats(1, likes(23)).expect("recompute");
        assert_eq!(ledger.get_or_create(1).expect("load").level, 5);
        let before = events(&recorder).len();

        let outcome = ledger.recompute_from_stats(1, likes(24)).expect("recompute");
        assert_eq!(
            outcome,
            RecomputeOutcome {
                leveled_up: true,
                new_level: Some(6)
            }
        );

        let published = events(&recorder);
        assert_eq!(published.len(), before + 1);
        let last = published.last().expect("event");
        assert_eq!((last.user_id, last.old_level, last.new_level), (1, 5, 6));

        let record = ledger.get_or_create(1).expect("load");
        assert_eq!(record.current_exp, 48);
        assert_eq!(record.last_level_up, Some(last.timestamp));
    }

    #[test]
    fn test_recompute_with_same_stats_is_quiet() {
        let (ledger, recorder) = ledger();
        ledger.recompute_from_stats(1, likes(30)).expect("recompute");
        let stored = ledger.get_or_create(1).expect("load");
        let before = events(&recorder).len();

        let outcome = ledger.recompute_from_stats(1, likes(30)).expect("recompute");
        assert_eq!(
            outcome,
            RecomputeOutcome {
                leveled_up: false,
                new_level: None
            }
        );
        assert_eq!(events(&recorder).len(), before);
        assert_eq!(ledger.get_or_create(1).expect("load"), stored);
    }

    #[test]
    fn test_shrinking_stats_lower_level_without_event() {
        let (ledger, recorder) = ledger();
        ledger.recompute_from_stats(1, likes(24)).expect("recompute");
        let before = events(&recorder).len();

        let outcome = ledger.recompute_from_stats(1, likes(10)).expect("recompute");
        assert!(!outcome.leveled_up);

        let record = ledger.get_or_create(1).expect("load");
        assert_eq!(record.current_exp, 20);
        assert_eq!(record.level, 3);
        assert_eq!(events(&recorder).len(), before);
    }

    #[test]
    fn test_high_water_mark_keeps_level() {
        let config = LevelingConfig {
            level_policy: LevelPolicy::HighWaterMark,
            ..LevelingConfig::default()
        };
        let (ledger, _) = ledger_with(config);
        ledger.recompute_from_stats(1, likes(24)).expect("recompute");
        ledger.recompute_from_stats(1, likes(10)).expect("recompute");

        let record = ledger.get_or_create(1).expect("load");
        assert_eq!(record.current_exp, 20);
        assert_eq!(record.level, 6);
    }

    #[test]
    fn test_record_activity_adds_to_stored_stats() {
        let (ledger, _) = ledger();
        ledger
            .record_activity(4, ActivityKind::PostCreated, 2)
            .expect("record");
        ledger
            .record_activity(4, ActivityKind::LikeReceived, 5)
            .expect("record");

        let record = ledger.get_or_create(4).expect("load");
        assert_eq!(record.stats.total_posts, 2);
        assert_eq!(record.stats.total_likes, 5);
        assert_eq!(record.current_exp, 16);
        assert_eq!(record.level, 3);
    }

    #[test]
    fn test_set_exp_directly_keeps_stats() {
        let (ledger, recorder) = ledger();
        ledger.recompute_from_stats(2, likes(3)).expect("recompute");
        let before = events(&recorder).len();

        let record = ledger.set_exp_directly(2, 800).expect("set");
        assert_eq!(record.level, ledger.level_table().level_for_exp(800));
        assert_eq!(record.level, 31);
        assert_eq!(record.stats, likes(3));
        assert!(record.last_level_up.is_some());
        assert_eq!(events(&recorder).len(), before);

        // Next recompute goes back to the stats
        ledger.recompute_from_stats(2, likes(3)).expect("recompute");
        assert_eq!(ledger.get_or_create(2).expect("load").current_exp, 6);
    }

    #[test]
    fn test_set_exp_directly_same_level_keeps_timestamp() {
        let (ledger, _) = ledger();
        let record = ledger.set_exp_directly(2, 3).expect("set");
        assert_eq!(record.level, 1);
        assert_eq!(record.last_level_up, None);
    }

    #[test]
    fn test_set_exp_directly_caps_exp() {
        let (ledger, _) = ledger();
        let record = ledger.set_exp_directly(2, u64::MAX).expect("set");
        assert_eq!(record.current_exp, MAX_EXP);
        assert_eq!(record.level, 99);
    }

    #[test]
    fn test_achievement_bonus_respects_exp_cap() {
        let (ledger, _) = ledger();
        ledger.set_exp_directly(5, MAX_EXP).expect("set");
        let mut record = ledger.get_or_create(5).expect("load");
        record.stats.total_posts = 1;
        ledger.store().save(&record).expect("save");

        assert_eq!(ledger.check_achievements(5).expect("check"), vec!["first_post".to_string()]);
        assert_eq!(ledger.get_or_create(5).expect("load").current_exp, MAX_EXP);
    }

    #[test]
    fn test_achievements_granted_once() {
        let (ledger, _) = ledger();
        let stats = ActivityStats {
            total_posts: 1,
            total_likes: 1,
            ..ActivityStats::default()
        };
        ledger.recompute_from_stats(3, stats).expect("recompute");
        // 1 post (3) + 1 like (2)
        assert_eq!(ledger.get_or_create(3).expect("load").current_exp, 5);

        let granted = ledger.check_achievements(3).expect("check");
        assert_eq!(granted, vec!["first_post".to_string(), "first_like".to_string()]);

        let record = ledger.get_or_create(3).expect("load");
        assert_eq!(record.current_exp, 20);
        assert_eq!(record.level, ledger.level_table().level_for_exp(20));
        assert_eq!(record.achievements, granted);

        assert!(ledger.check_achievements(3).expect("check").is_empty());
        assert_eq!(ledger.get_or_create(3).expect("load").current_exp, 20);
    }

    #[test]
    fn test_achievement_level_up_is_published() {
        let (ledger, recorder) = ledger();
        let stats = ActivityStats {
            total_posts: 1,
            ..ActivityStats::default()
        };
        ledger.recompute_from_stats(3, stats).expect("recompute");
        assert!(events(&recorder).is_empty());

        // 3 + 10 bonus = 13 -> level 2
        ledger.check_achievements(3).expect("check");
        let published = events(&recorder);
        assert_eq!(published.len(), 1);
        assert_eq!((published[0].old_level, published[0].new_level), (1, 2));
    }

    #[test]
    fn test_reset_all_returns_to_defaults() {
        let (ledger, _) = ledger();
        ledger.recompute_from_stats(1, likes(100)).expect("recompute");
        ledger.check_achievements(1).expect("check");
        ledger.recompute_from_stats(2, likes(5)).expect("recompute");

        assert_eq!(ledger.reset_all().expect("reset"), 2);
        assert_eq!(ledger.get_or_create(1).expect("load"), UserLevelRecord::new(1));
        assert_eq!(ledger.get_or_create(2).expect("load"), UserLevelRecord::new(2));
    }

    #[test]
    fn test_reload_config_changes_weights() {
        let (ledger, _) = ledger();
        ledger.recompute_from_stats(1, likes(10)).expect("recompute");
        assert_eq!(ledger.get_or_create(1).expect("load").current_exp, 20);

        let mut config = LevelingConfig::default();
        config.weights.like_received = 5;
        ledger.reload_config(&config);

        ledger.recompute_from_stats(1, likes(10)).expect("recompute");
        assert_eq!(ledger.get_or_create(1).expect("load").current_exp, 50);
    }

    #[test]
    fn test_leaderboard_orders_and_limits() {
        let (ledger, _) = ledger();
        ledger.recompute_from_stats(1, likes(5)).expect("recompute");
        ledger.recompute_from_stats(2, likes(50)).expect("recompute");
        ledger.recompute_from_stats(3, likes(5)).expect("recompute");

        let ids: Vec<u64> = ledger
            .leaderboard(2)
            .expect("leaderboard")
            .iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_panicking_observer_does_not_lose_record() {
        let ledger = ActivityLedger::new(
            MemoryStore::new(),
            &LevelingConfig::default(),
            Arc::new(Panicker),
        );
        let outcome = ledger.recompute_from_stats(1, likes(24)).expect("recompute");
        assert!(outcome.leveled_up);
        assert_eq!(ledger.get_or_create(1).expect("load").level, 6);
    }

    #[test]
    fn test_bus_subscriber_sees_recompute_event() {
        let bus = LevelUpBus::default();
        let mut rx = bus.subscribe();
        let ledger = ActivityLedger::new(
            MemoryStore::new(),
            &LevelingConfig::default(),
            Arc::new(bus),
        );

        ledger.recompute_from_stats(8, likes(4)).expect("recompute");
        let event = rx.try_recv().expect("event");
        assert_eq!((event.user_id, event.old_level, event.new_level), (8, 1, 2));
    }
}
