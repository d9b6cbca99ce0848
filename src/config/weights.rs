//! Activity point weights

use serde::{Deserialize, Serialize};

use crate::leveling::ActivityKind;

/// Points awarded per unit of each activity kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityWeights {
    #[serde(default = "default_like_received")]
    pub like_received: u64,

    #[serde(default = "default_story_promoted")]
    pub story_promoted: u64,

    #[serde(default = "default_bookmarked")]
    pub bookmarked: u64,

    #[serde(default = "default_post_created")]
    pub post_created: u64,

    #[serde(default = "default_comment_created")]
    pub comment_created: u64,

    #[serde(default = "default_excellent_post")]
    pub excellent_post: u64,
}

fn default_like_received() -> u64 {
    2
}

fn default_story_promoted() -> u64 {
    10
}

fn default_bookmarked() -> u64 {
    2
}

fn default_post_created() -> u64 {
    3
}

fn default_comment_created() -> u64 {
    1
}

fn default_excellent_post() -> u64 {
    20
}

impl Default for ActivityWeights {
    fn default() -> Self {
        Self {
            like_received: default_like_received(),
            story_promoted: default_story_promoted(),
            bookmarked: default_bookmarked(),
            post_created: default_post_created(),
            comment_created: default_comment_created(),
            excellent_post: default_excellent_post(),
        }
    }
}

impl ActivityWeights {
    /// Points for one unit of `kind`
    pub fn points_for(&self, kind: ActivityKind) -> u64 {
        match kind {
            ActivityKind::LikeReceived => self.like_received,
            ActivityKind::StoryPromoted => self.story_promoted,
            ActivityKind::Bookmarked => self.bookmarked,
            ActivityKind::PostCreated => self.post_created,
            ActivityKind::CommentCreated => self.comment_created,
            ActivityKind::ExcellentPost => self.excellent_post,
        }
    }

    /// Points for an activity given by name. Unrecognized names are worth nothing.
    pub fn points_for_name(&self, name: &str) -> u64 {
        ActivityKind::parse(name)
            .map(|kind| self.points_for(kind))
            .unwrap_or(0)
    }
}
