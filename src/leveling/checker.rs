//! Achievement checking logic

use super::models::ActivityStats;
use crate::config::AchievementDef;

/// Achievements whose condition `stats` meets and that are not yet in
/// `unlocked`, in definition order.
pub fn check_achievements<'a>(
    definitions: &'a [AchievementDef],
    stats: &ActivityStats,
    unlocked: &[String],
) -> Vec<&'a AchievementDef> {
    definitions
        .iter()
        .filter(|def| !unlocked.iter().any(|id| id == &def.id))
        .filter(|def| def.is_met_by(stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_achievements;

    #[test]
    fn test_nothing_unlocked_for_empty_stats() {
        let defs = default_achievements();
        assert!(check_achievements(&defs, &ActivityStats::default(), &[]).is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let defs = default_achievements();
        let stats = ActivityStats {
            total_posts: 10,
            ..ActivityStats::default()
        };
        let ids: Vec<_> = check_achievements(&defs, &stats, &[])
            .into_iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first_post", "prolific_writer"]);
    }

    #[test]
    fn test_already_unlocked_skipped() {
        let defs = default_achievements();
        let stats = ActivityStats {
            total_posts: 10,
            ..ActivityStats::default()
        };
        let unlocked = vec!["first_post".to_string()];
        let ids: Vec<_> = check_achievements(&defs, &stats, &unlocked)
            .into_iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["prolific_writer"]);
    }
}
