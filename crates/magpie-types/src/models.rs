use serde::{Deserialize, Serialize};

/// Minimal user reference embedded in tweets and follower/following lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
}

/// A user who liked a tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRef {
    pub user_id: i64,
    pub name: String,
}

/// Full tweet projection: author, attachment paths and likes joined in.
///
/// This is both the response payload and the cache snapshot, so it must
/// round-trip through serde without loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetDetail {
    pub id: i64,
    pub content: String,
    pub attachments: Vec<String>,
    pub author: UserRef,
    pub likes: Vec<LikeRef>,
}

/// Full user projection with both sides of the follow relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: i64,
    pub name: String,
    pub followers: Vec<UserRef>,
    pub following: Vec<UserRef>,
}

/// Partial update for a user. Unset fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub active: Option<bool>,
}
