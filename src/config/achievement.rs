//! Achievement definitions

use serde::{Deserialize, Serialize};

use crate::leveling::ActivityStats;

/// Stat counter an achievement condition looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementStat {
    Posts,
    Likes,
    Promoted,
    Comments,
}

impl AchievementStat {
    /// Read the matching counter from `stats`
    pub fn value_in(&self, stats: &ActivityStats) -> u64 {
        match self {
            Self::Posts => stats.total_posts,
            Self::Likes => stats.total_likes,
            Self::Promoted => stats.story_promotions,
            Self::Comments => stats.total_comments,
        }
    }
}

/// One-time bonus granted when `stat` reaches `threshold`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Stable identifier stored in user records
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub stat: AchievementStat,
    pub threshold: u64,
    /// Experience added directly on unlock
    pub reward: u64,
}

impl AchievementDef {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        stat: AchievementStat,
        threshold: u64,
        reward: u64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            stat,
            threshold,
            reward,
        }
    }

    /// Whether `stats` satisfy the unlock condition
    pub fn is_met_by(&self, stats: &ActivityStats) -> bool {
        self.stat.value_in(stats) >= self.threshold
    }
}

pub fn default_achievements() -> Vec<AchievementDef> {
    vec![
        AchievementDef::new(
            "first_post",
            "First Post",
            "Published a first story or lounge post",
            AchievementStat::Posts,
            1,
            10,
        ),
        AchievementDef::new(
            "prolific_writer",
            "Prolific Writer",
            "Published 10 posts",
            AchievementStat::Posts,
            10,
            50,
        ),
        AchievementDef::new(
            "first_like",
            "First Like",
            "Received a first like",
            AchievementStat::Likes,
            1,
            5,
        ),
        AchievementDef::new(
            "crowd_favorite",
            "Crowd Favorite",
            "Received 100 likes",
            AchievementStat::Likes,
            100,
            100,
        ),
        AchievementDef::new(
            "featured_story",
            "Featured Story",
            "Had a story promoted",
            AchievementStat::Promoted,
            1,
            30,
        ),
        AchievementDef::new(
            "conversationalist",
            "Conversationalist",
            "Wrote 20 comments",
            AchievementStat::Comments,
            20,
            30,
        ),
    ]
}
