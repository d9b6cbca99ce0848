//! Tier configuration types

use serde::{Deserialize, Serialize};

/// Inclusive `[start, end]` level range, written as a two-element array in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange(pub u32, pub u32);

impl LevelRange {
    pub fn start(&self) -> u32 {
        self.0
    }

    pub fn end(&self) -> u32 {
        self.1
    }

    pub fn contains(&self, level: u32) -> bool {
        level >= self.0 && level <= self.1
    }
}

/// A contiguous run of levels sharing one geometric growth formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSetting {
    /// Display label (e.g. "Newcomer")
    pub name: String,

    /// Levels covered by this tier
    pub level_range: LevelRange,

    /// Experience required to reach `level_range.start`
    pub base_exp: f64,

    /// Experience delta for the first level-up inside the tier
    pub exp_increment: f64,

    /// Per-level growth factor applied to the increment (>= 1.0)
    pub exp_multiplier: f64,

    /// Display text, never used in computation
    #[serde(default)]
    pub description: String,
}

impl TierSetting {
    pub fn new(
        name: &str,
        level_range: LevelRange,
        base_exp: f64,
        exp_increment: f64,
        exp_multiplier: f64,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            level_range,
            base_exp,
            exp_increment,
            exp_multiplier,
            description: description.to_string(),
        }
    }
}

/// Built-in tier ladder covering levels 1-99
pub fn default_tiers() -> Vec<TierSetting> {
    vec![
        TierSetting::new(
            "Newcomer",
            LevelRange(1, 10),
            0.0,
            8.0,
            1.1,
            "Getting to know the lounge",
        ),
        TierSetting::new(
            "Contributor",
            LevelRange(11, 30),
            120.0,
            15.0,
            1.08,
            "Regular voice in the community",
        ),
        TierSetting::new(
            "Expert",
            LevelRange(31, 50),
            800.0,
            40.0,
            1.06,
            "Trusted HR practitioner",
        ),
        TierSetting::new(
            "Mentor",
            LevelRange(51, 70),
            2300.0,
            90.0,
            1.05,
            "Shapes discussions and guides others",
        ),
        TierSetting::new(
            "Legend",
            LevelRange(71, 99),
            5300.0,
            180.0,
            1.04,
            "Pillar of the community",
        ),
    ]
}
