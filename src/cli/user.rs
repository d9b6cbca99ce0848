//! Per-user command implementations

use anyhow::Result;

use lounge_level::{ActivityLedger, ActivityStats, LevelStore};

/// Show a user's record and ladder position
pub fn show_command<S: LevelStore>(
    ledger: &ActivityLedger<S>,
    user_id: u64,
    json: bool,
) -> Result<()> {
    let record = ledger.get_or_create(user_id)?;
    let progress = ledger.progress(user_id)?;

    if json {
        let value = serde_json::json!({
            "record": record,
            "progress": progress,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("User {}", record.user_id);
    println!(
        "  Level {} ({}) - {} exp",
        record.level, progress.tier, record.current_exp
    );
    match progress.next_level_exp {
        Some(next) => println!(
            "  Next level at {} exp ({} to go, {:.1}%)",
            next, progress.exp_to_next, progress.percent
        ),
        None => println!("  Max level reached"),
    }
    if let Some(at) = record.last_level_up {
        println!("  Last level-up: {}", at.to_rfc3339());
    }

    let s = &record.stats;
    println!(
        "  Stats: {} posts, {} comments, {} likes, {} promotions, {} bookmarks, {} excellent",
        s.total_posts,
        s.total_comments,
        s.total_likes,
        s.story_promotions,
        s.total_bookmarks,
        s.excellent_posts
    );
    if !record.achievements.is_empty() {
        println!("  Achievements: {}", record.achievements.join(", "));
    }

    Ok(())
}

/// Replace a user's stats with authoritative counts
pub fn recompute_command<S: LevelStore>(
    ledger: &ActivityLedger<S>,
    user_id: u64,
    stats: ActivityStats,
) -> Result<()> {
    let outcome = ledger.recompute_from_stats(user_id, stats)?;
    let record = ledger.get_or_create(user_id)?;

    match outcome.new_level {
        Some(level) => println!("User {} leveled up to {} ({} exp)", user_id, level, record.current_exp),
        None => println!(
            "User {} is level {} ({} exp)",
            user_id, record.level, record.current_exp
        ),
    }
    Ok(())
}

/// Grant any achievements the user now qualifies for
pub fn achievements_command<S: LevelStore>(ledger: &ActivityLedger<S>, user_id: u64) -> Result<()> {
    let granted = ledger.check_achievements(user_id)?;
    if granted.is_empty() {
        println!("No new achievements.");
        return Ok(());
    }

    println!("Unlocked ({}):", granted.len());
    for id in granted {
        println!("  {}", id);
    }
    Ok(())
}

/// Print the top users by exp
pub fn leaderboard_command<S: LevelStore>(ledger: &ActivityLedger<S>, limit: usize) -> Result<()> {
    let records = ledger.leaderboard(limit)?;
    if records.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    for (rank, record) in records.iter().enumerate() {
        println!(
            "  {:>3}. user {:<10} Lv {:>2}  {:>8} exp",
            rank + 1,
            record.user_id,
            record.level,
            record.current_exp
        );
    }
    Ok(())
}
