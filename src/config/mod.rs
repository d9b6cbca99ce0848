//! Configuration loading and management
//!
//! The leveling configuration is an explicit value handed to the ledger at
//! construction time. Edits go through [`crate::ActivityLedger::reload_config`],
//! which regenerates the threshold table.

mod achievement;
mod io;
mod tier;
mod weights;

pub use achievement::{default_achievements, AchievementDef, AchievementStat};
pub use tier::{default_tiers, LevelRange, TierSetting};
pub use weights::ActivityWeights;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::leveling::levels::{tier_thresholds, MAX_LEVEL, MIN_LEVEL};

/// How a recompute treats a computed level below the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelPolicy {
    /// Level always follows the current stats and may go down
    #[default]
    Recompute,
    /// Level never goes down through a recompute
    HighWaterMark,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelingConfig {
    /// Level-down behavior on recompute
    #[serde(default)]
    pub level_policy: LevelPolicy,

    /// Points per activity kind
    #[serde(default)]
    pub weights: ActivityWeights,

    /// Ordered tier ladder covering levels 1-99
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierSetting>,

    /// One-time bonus grants
    #[serde(default = "default_achievements")]
    pub achievements: Vec<AchievementDef>,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            level_policy: LevelPolicy::default(),
            weights: ActivityWeights::default(),
            tiers: default_tiers(),
            achievements: default_achievements(),
        }
    }
}

/// Rejected configurations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("No tiers configured")]
    NoTiers,

    #[error("First tier must start at level 1, got {0}")]
    FirstTierStart(u32),

    #[error("Last tier must end at level 99, got {0}")]
    LastTierEnd(u32),

    #[error("Tier '{name}' has an inverted range [{start}, {end}]")]
    InvertedRange { name: String, start: u32, end: u32 },

    #[error("Tier '{name}' starts at level {start}, expected {expected}")]
    NotContiguous {
        name: String,
        start: u32,
        expected: u32,
    },

    #[error("Tier '{name}' has invalid exp_multiplier {value} (must be finite and >= 1.0)")]
    InvalidMultiplier { name: String, value: f64 },

    #[error("Tier '{name}' has invalid {field} {value} (must be finite and >= 0)")]
    InvalidExp {
        name: String,
        field: &'static str,
        value: f64,
    },

    #[error("Tier '{name}' base_exp {base_exp} is below the previous tier's last threshold {previous}")]
    NonMonotonic {
        name: String,
        base_exp: f64,
        previous: u64,
    },

    #[error("Duplicate achievement id: {0}")]
    DuplicateAchievement(String),
}

impl LevelingConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: LevelingConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Check tier contiguity, growth parameters and achievement ids.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let first = self.tiers.first().ok_or(ConfigError::NoTiers)?;
        if first.level_range.start() != MIN_LEVEL {
            return Err(ConfigError::FirstTierStart(first.level_range.start()));
        }

        let mut previous: Option<&TierSetting> = None;
        for tier in &self.tiers {
            let (start, end) = (tier.level_range.start(), tier.level_range.end());
            if start > end {
                return Err(ConfigError::InvertedRange {
                    name: tier.name.clone(),
                    start,
                    end,
                });
            }
            if !tier.exp_multiplier.is_finite() || tier.exp_multiplier < 1.0 {
                return Err(ConfigError::InvalidMultiplier {
                    name: tier.name.clone(),
                    value: tier.exp_multiplier,
                });
            }
            for (field, value) in [
                ("base_exp", tier.base_exp),
                ("exp_increment", tier.exp_increment),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidExp {
                        name: tier.name.clone(),
                        field,
                        value,
                    });
                }
            }

            if let Some(prev) = previous {
                let expected = prev.level_range.end() + 1;
                if start != expected {
                    return Err(ConfigError::NotContiguous {
                        name: tier.name.clone(),
                        start,
                        expected,
                    });
                }
                let prev_last = tier_thresholds(prev).last().map(|(_, exp)| exp).unwrap_or(0);
                if tier.base_exp.floor() < prev_last as f64 {
                    return Err(ConfigError::NonMonotonic {
                        name: tier.name.clone(),
                        base_exp: tier.base_exp,
                        previous: prev_last,
                    });
                }
            }
            previous = Some(tier);
        }

        if let Some(last) = previous {
            if last.level_range.end() != MAX_LEVEL {
                return Err(ConfigError::LastTierEnd(last.level_range.end()));
            }
        }

        let mut seen = HashSet::new();
        for def in &self.achievements {
            if !seen.insert(def.id.as_str()) {
                return Err(ConfigError::DuplicateAchievement(def.id.clone()));
            }
        }

        Ok(())
    }
}
