//! Experience and level table
//!
//! Thresholds are generated once from the tier ladder: inside a tier every
//! level-up costs `exp_increment * exp_multiplier^(p-1)` more than the last,
//! where `p` is the level's position inside the tier. Each level's threshold
//! is the running total, floored.

use serde::Serialize;

use super::models::{ActivityKind, ActivityStats, LevelProgress};
use crate::config::{ActivityWeights, TierSetting};

/// Lowest reachable level
pub const MIN_LEVEL: u32 = 1;

/// Highest reachable level
pub const MAX_LEVEL: u32 = 99;

/// Ceiling for accumulated experience. Fits a signed 64-bit SQLite integer.
pub const MAX_EXP: u64 = i64::MAX as u64;

/// Thresholds `(level, min_exp)` for every level of one tier
pub fn tier_thresholds(tier: &TierSetting) -> impl Iterator<Item = (u32, u64)> + '_ {
    let start = tier.level_range.start();
    (start..=tier.level_range.end()).scan(tier.base_exp, move |current, level| {
        let position = level - start;
        if position > 0 {
            let exponent = i32::try_from(position - 1).unwrap_or(i32::MAX);
            *current += tier.exp_increment * tier.exp_multiplier.powi(exponent);
        }
        Some((level, floor_exp(*current)))
    })
    .take_while(|(level, _)| *level <= MAX_LEVEL)
}

/// Generate the threshold for every level 1..=99.
///
/// Index `i` holds the threshold of level `i + 1`. Tier ranges outside 1..=99
/// are ignored; a level no tier covers inherits the previous level's threshold.
pub fn generate_thresholds(tiers: &[TierSetting]) -> Vec<u64> {
    let mut slots: Vec<Option<u64>> = vec![None; MAX_LEVEL as usize];
    for tier in tiers {
        for (level, exp) in tier_thresholds(tier) {
            if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
                slots[(level - 1) as usize] = Some(exp);
            }
        }
    }

    let mut carried = 0;
    slots
        .into_iter()
        .map(|slot| {
            if let Some(exp) = slot {
                carried = exp;
            }
            carried
        })
        .collect()
}

/// Total experience for a set of activity counts: a plain weighted sum,
/// capped at [`MAX_EXP`].
pub fn exp_from_stats(stats: &ActivityStats, weights: &ActivityWeights) -> u64 {
    ActivityKind::ALL
        .iter()
        .fold(0u64, |total, &kind| {
            total.saturating_add(stats.count(kind).saturating_mul(weights.points_for(kind)))
        })
        .min(MAX_EXP)
}

fn floor_exp(value: f64) -> u64 {
    // `as` saturates: negatives and NaN become 0
    value.floor() as u64
}

/// Level thresholds derived from a tier configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelTable {
    thresholds: Vec<u64>,
    tiers: Vec<TierSetting>,
}

impl LevelTable {
    /// Build the table. The tiers are not validated here; see
    /// [`crate::config::LevelingConfig::validate`].
    pub fn new(tiers: &[TierSetting]) -> Self {
        let thresholds = generate_thresholds(tiers);
        tracing::debug!(
            tiers = tiers.len(),
            max_threshold = thresholds.last().copied().unwrap_or(0),
            "Generated level thresholds"
        );
        Self {
            thresholds,
            tiers: tiers.to_vec(),
        }
    }

    /// Thresholds for levels 1..=99 (index 0 is level 1)
    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    pub fn tiers(&self) -> &[TierSetting] {
        &self.tiers
    }

    /// Highest level whose threshold `total_exp` meets. Scans upward and
    /// stops at the first unmet threshold.
    pub fn level_for_exp(&self, total_exp: u64) -> u32 {
        let mut level = MIN_LEVEL;
        for (index, &threshold) in self.thresholds.iter().enumerate().skip(1) {
            if total_exp < threshold {
                break;
            }
            level = index as u32 + 1;
        }
        level
    }

    /// Minimum experience to be at `level`. 0 below level 1, clamped to the
    /// level-99 threshold above it.
    pub fn exp_required_for_level(&self, level: u32) -> u64 {
        if level < MIN_LEVEL {
            return 0;
        }
        let level = level.min(MAX_LEVEL);
        self.thresholds
            .get((level - 1) as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Experience still missing for the next level (0 at max level)
    pub fn exp_to_next_level(&self, total_exp: u64) -> u64 {
        let level = self.level_for_exp(total_exp);
        if level >= MAX_LEVEL {
            return 0;
        }
        self.exp_required_for_level(level + 1)
            .saturating_sub(total_exp)
    }

    /// Percent of the way from the current level's threshold to the next one,
    /// in `[0, 100]`. Max level and degenerate (non-increasing) steps report 100.
    pub fn progress_within_level(&self, total_exp: u64) -> f64 {
        let level = self.level_for_exp(total_exp);
        if level >= MAX_LEVEL {
            return 100.0;
        }

        let current = self.exp_required_for_level(level) as f64;
        let next = self.exp_required_for_level(level + 1) as f64;
        let span = next - current;
        if span <= 0.0 {
            return 100.0;
        }

        ((total_exp as f64 - current) / span * 100.0).clamp(0.0, 100.0)
    }

    /// Tier containing `level`, if any
    pub fn tier_for_level(&self, level: u32) -> Option<&TierSetting> {
        self.tiers.iter().find(|t| t.level_range.contains(level))
    }

    /// Full progress summary for `total_exp`
    pub fn progress(&self, total_exp: u64) -> LevelProgress {
        let level = self.level_for_exp(total_exp);
        let next_level_exp = if level >= MAX_LEVEL {
            None
        } else {
            Some(self.exp_required_for_level(level + 1))
        };

        LevelProgress {
            level,
            tier: self
                .tier_for_level(level)
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            total_exp,
            current_level_exp: self.exp_required_for_level(level),
            next_level_exp,
            exp_to_next: self.exp_to_next_level(total_exp),
            percent: self.progress_within_level(total_exp),
        }
    }
}
