//! Table command implementation

use lounge_level::leveling::{levels, MAX_LEVEL, MIN_LEVEL};
use lounge_level::LevelTable;

/// Print every level's threshold, grouped by tier
pub fn table_command(table: &LevelTable) {
    for tier in table.tiers() {
        println!(
            "{} (levels {}-{}){}",
            tier.name,
            tier.level_range.start(),
            tier.level_range.end(),
            if tier.description.is_empty() {
                String::new()
            } else {
                format!(" - {}", tier.description)
            }
        );
        for (level, _) in levels::tier_thresholds(tier) {
            if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
                continue;
            }
            let required = table.exp_required_for_level(level);
            let step = required.saturating_sub(table.exp_required_for_level(level - 1));
            println!("  Lv {:>2}  {:>8} exp  (+{})", level, required, step);
        }
    }
}
