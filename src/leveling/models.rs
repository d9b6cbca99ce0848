//! Data models for level records and activity counts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of activity that earn experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    LikeReceived,
    StoryPromoted,
    Bookmarked,
    PostCreated,
    CommentCreated,
    ExcellentPost,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 6] = [
        Self::LikeReceived,
        Self::StoryPromoted,
        Self::Bookmarked,
        Self::PostCreated,
        Self::CommentCreated,
        Self::ExcellentPost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LikeReceived => "like_received",
            Self::StoryPromoted => "story_promoted",
            Self::Bookmarked => "bookmarked",
            Self::PostCreated => "post_created",
            Self::CommentCreated => "comment_created",
            Self::ExcellentPost => "excellent_post",
        }
    }

    /// Parse a snake_case or camelCase kind name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "like_received" | "likeReceived" => Some(Self::LikeReceived),
            "story_promoted" | "storyPromoted" => Some(Self::StoryPromoted),
            "bookmarked" => Some(Self::Bookmarked),
            "post_created" | "postCreated" => Some(Self::PostCreated),
            "comment_created" | "commentCreated" => Some(Self::CommentCreated),
            "excellent_post" | "excellentPost" => Some(Self::ExcellentPost),
            _ => None,
        }
    }
}

/// Authoritative activity counters for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    /// Likes received on the user's posts
    #[serde(default)]
    pub total_likes: u64,
    /// Stories promoted to the front page
    #[serde(default)]
    pub story_promotions: u64,
    /// Bookmarks other users placed on the user's posts
    #[serde(default)]
    pub total_bookmarks: u64,
    #[serde(default)]
    pub total_posts: u64,
    #[serde(default)]
    pub total_comments: u64,
    /// Posts flagged as excellent by moderators
    #[serde(default)]
    pub excellent_posts: u64,
}

impl ActivityStats {
    /// Counter that `kind` contributes to
    pub fn count(&self, kind: ActivityKind) -> u64 {
        match kind {
            ActivityKind::LikeReceived => self.total_likes,
            ActivityKind::StoryPromoted => self.story_promotions,
            ActivityKind::Bookmarked => self.total_bookmarks,
            ActivityKind::PostCreated => self.total_posts,
            ActivityKind::CommentCreated => self.total_comments,
            ActivityKind::ExcellentPost => self.excellent_posts,
        }
    }

    fn count_mut(&mut self, kind: ActivityKind) -> &mut u64 {
        match kind {
            ActivityKind::LikeReceived => &mut self.total_likes,
            ActivityKind::StoryPromoted => &mut self.story_promotions,
            ActivityKind::Bookmarked => &mut self.total_bookmarks,
            ActivityKind::PostCreated => &mut self.total_posts,
            ActivityKind::CommentCreated => &mut self.total_comments,
            ActivityKind::ExcellentPost => &mut self.excellent_posts,
        }
    }

    /// Copy with `count` more of `kind`
    pub fn with_added(mut self, kind: ActivityKind, count: u64) -> Self {
        let slot = self.count_mut(kind);
        *slot = slot.saturating_add(count);
        self
    }
}

/// Stored level state of one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLevelRecord {
    pub user_id: u64,
    /// Cached weighted sum of `stats`, plus any achievement bonuses
    pub current_exp: u64,
    /// Cached level for change detection
    pub level: u32,
    pub last_level_up: Option<DateTime<Utc>>,
    /// Achievement ids already granted, in grant order
    pub achievements: Vec<String>,
    pub stats: ActivityStats,
}

impl UserLevelRecord {
    /// Fresh record: level 1, no experience, zero stats
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            current_exp: 0,
            level: 1,
            last_level_up: None,
            achievements: Vec::new(),
            stats: ActivityStats::default(),
        }
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }
}

/// Result of a recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecomputeOutcome {
    pub leveled_up: bool,
    /// Set only when `leveled_up`
    pub new_level: Option<u32>,
}

/// Where a given experience total sits on the ladder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    /// Name of the tier containing `level`
    pub tier: String,
    pub total_exp: u64,
    /// Threshold of the current level
    pub current_level_exp: u64,
    /// Threshold of the next level (None at max level)
    pub next_level_exp: Option<u64>,
    pub exp_to_next: u64,
    /// 0-100
    pub percent: f64,
}
