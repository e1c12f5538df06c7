//! Database row types and explicit outcomes for relationship operations.
//!
//! Rows map directly to SQLite columns and stay distinct from the
//! magpie-types API projections. The outcome enums let the service layer
//! translate storage-level conditions (duplicate edge, vanished target)
//! without inspecting engine error codes.

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub hashed_password: String,
    pub active: bool,
}

pub struct TweetRow {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
}

pub struct MediaRow {
    pub id: i64,
    pub path: String,
    pub tweet_id: Option<i64>,
}

/// Result of inserting a follow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyExists,
    TargetMissing,
}

/// Result of removing a follow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
    TargetMissing,
}

/// Result of inserting a like edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Created,
    AlreadyLiked,
    TweetMissing,
}
