use std::path::PathBuf;
use std::sync::Arc;

use magpie_cache::{Cache, keys};
use magpie_db::Database;
use magpie_db::models::{FollowOutcome, UnfollowOutcome};
use magpie_queue::OffloadQueue;
use magpie_types::api::default_limit;
use magpie_types::models::{UserDetail, UserPatch, UserRef};

use super::snapshot;
use crate::error::ApiError;

/// User orchestration: cache-through reads and idempotent follow edges.
/// Follow mutations invalidate both parties, since each side's cached
/// projection embeds the other.
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    cache: Arc<dyn Cache>,
    queue: OffloadQueue,
}

impl UserService {
    pub fn new(db: Arc<Database>, cache: Arc<dyn Cache>, queue: OffloadQueue) -> Self {
        Self { db, cache, queue }
    }

    pub fn get(&self, user_id: i64) -> Result<UserDetail, ApiError> {
        let key = keys::item(keys::USERS, user_id);
        if let Some(cached) = self.cache.get(&key) {
            if let Ok(detail) = serde_json::from_str(&cached) {
                return Ok(detail);
            }
            self.cache.delete(&key);
        }

        let detail = self.db.user_detail(user_id)?.ok_or(ApiError::UserNotFound)?;
        self.cache.set(&key, &snapshot(&detail)?);
        Ok(detail)
    }

    pub fn get_all(&self, skip: u32, limit: u32) -> Result<Vec<UserRef>, ApiError> {
        let default_page = skip == 0 && limit == default_limit();
        if default_page {
            if let Some(cached) = self.cache.get(keys::USERS) {
                if let Ok(page) = serde_json::from_str(&cached) {
                    return Ok(page);
                }
                self.cache.delete(keys::USERS);
            }
        }

        let page: Vec<UserRef> = self
            .db
            .get_users(skip, limit)?
            .into_iter()
            .map(|row| UserRef {
                id: row.id,
                name: row.name,
            })
            .collect();
        if default_page && !page.is_empty() {
            self.cache.set(keys::USERS, &snapshot(&page)?);
        }
        Ok(page)
    }

    /// Follow. Re-following is a benign no-op; a vanished target maps to
    /// `UserNotFound`.
    pub fn add_follow(&self, follower_id: i64, followed_id: i64) -> Result<(), ApiError> {
        match self.db.add_follow(follower_id, followed_id)? {
            FollowOutcome::TargetMissing => Err(ApiError::UserNotFound),
            FollowOutcome::Created | FollowOutcome::AlreadyExists => {
                self.invalidate_pair(follower_id, followed_id);
                Ok(())
            }
        }
    }

    /// Unfollow, symmetric to [`add_follow`]: removing a non-existent
    /// edge succeeds.
    pub fn remove_follow(&self, follower_id: i64, unfollowed_id: i64) -> Result<(), ApiError> {
        match self.db.unfollow(follower_id, unfollowed_id)? {
            UnfollowOutcome::TargetMissing => Err(ApiError::UserNotFound),
            UnfollowOutcome::Removed | UnfollowOutcome::NotFollowing => {
                self.invalidate_pair(follower_id, unfollowed_id);
                Ok(())
            }
        }
    }

    pub fn update(&self, user_id: i64, patch: &UserPatch) -> Result<(), ApiError> {
        self.db
            .update_user(user_id, patch)?
            .ok_or(ApiError::UserNotFound)?;
        self.cache.delete(&keys::item(keys::USERS, user_id));
        self.cache.delete(keys::USERS);
        Ok(())
    }

    /// Remove a user, queue cleanup of their attachment files, and sweep
    /// both namespaces: other users' cached follower/following lists may
    /// embed the removed user, and cached tweet pages may embed their
    /// tweets (which cascade away with the row).
    pub fn remove(&self, user_id: i64) -> Result<(), ApiError> {
        let paths = self.db.media_paths_for_author(user_id)?;
        let removed = self.db.remove_user(user_id)?;
        if removed && !paths.is_empty() {
            self.queue
                .submit_delete(paths.iter().map(PathBuf::from).collect());
        }
        self.cache.delete_prefix(keys::USERS);
        self.cache.delete_prefix(keys::TWEETS);
        Ok(())
    }

    fn invalidate_pair(&self, a: i64, b: i64) {
        self.cache.delete(&keys::item(keys::USERS, a));
        self.cache.delete(&keys::item(keys::USERS, b));
        self.cache.delete(keys::USERS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magpie_cache::MemoryCache;
    use magpie_queue::Job;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn service() -> (
        UserService,
        Arc<Database>,
        Arc<dyn Cache>,
        UnboundedReceiver<Job>,
    ) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let (queue, jobs) = OffloadQueue::channel();
        let svc = UserService::new(db.clone(), cache.clone(), queue);
        (svc, db, cache, jobs)
    }

    #[test]
    fn test_get_unknown_user() {
        let (svc, _db, _cache, _jobs) = service();
        assert!(matches!(svc.get(1).unwrap_err(), ApiError::UserNotFound));
    }

    #[test]
    fn test_follow_is_idempotent_and_visible() {
        let (svc, db, _cache, _jobs) = service();
        let a = db.create_user("alice", "hash", true).unwrap();
        let b = db.create_user("bob", "hash", true).unwrap();

        svc.add_follow(a, b).unwrap();
        svc.add_follow(a, b).unwrap();

        let detail = svc.get(a).unwrap();
        assert_eq!(detail.following.len(), 1);
        assert_eq!(detail.following[0].id, b);

        assert!(matches!(
            svc.add_follow(a, 999).unwrap_err(),
            ApiError::UserNotFound
        ));
    }

    #[test]
    fn test_follow_invalidates_both_parties() {
        let (svc, db, cache, _jobs) = service();
        let a = db.create_user("alice", "hash", true).unwrap();
        let b = db.create_user("bob", "hash", true).unwrap();

        // Populate both item entries, then follow.
        svc.get(a).unwrap();
        svc.get(b).unwrap();
        svc.add_follow(a, b).unwrap();

        assert!(cache.get(&keys::item(keys::USERS, a)).is_none());
        assert!(cache.get(&keys::item(keys::USERS, b)).is_none());

        // The refetched projection reflects the new edge on both sides.
        assert_eq!(svc.get(b).unwrap().followers[0].id, a);
    }

    #[test]
    fn test_unfollow_is_benign_without_edge() {
        let (svc, db, _cache, _jobs) = service();
        let a = db.create_user("alice", "hash", true).unwrap();
        let b = db.create_user("bob", "hash", true).unwrap();

        svc.remove_follow(a, b).unwrap();

        svc.add_follow(a, b).unwrap();
        svc.remove_follow(a, b).unwrap();
        assert!(svc.get(a).unwrap().following.is_empty());

        assert!(matches!(
            svc.remove_follow(a, 999).unwrap_err(),
            ApiError::UserNotFound
        ));
    }

    #[test]
    fn test_update_invalidates_item() {
        let (svc, db, cache, _jobs) = service();
        let a = db.create_user("alice", "hash", true).unwrap();
        svc.get(a).unwrap();

        let patch = UserPatch {
            name: Some("alicia".to_string()),
            ..Default::default()
        };
        svc.update(a, &patch).unwrap();

        assert!(cache.get(&keys::item(keys::USERS, a)).is_none());
        assert_eq!(svc.get(a).unwrap().name, "alicia");

        assert!(matches!(
            svc.update(999, &patch).unwrap_err(),
            ApiError::UserNotFound
        ));
    }

    #[test]
    fn test_remove_sweeps_user_prefix() {
        let (svc, db, cache, _jobs) = service();
        let a = db.create_user("alice", "hash", true).unwrap();
        let b = db.create_user("bob", "hash", true).unwrap();
        svc.add_follow(a, b).unwrap();

        // Warm the collection and bob's entry (which embeds alice).
        svc.get_all(0, default_limit()).unwrap();
        svc.get(b).unwrap();

        svc.remove(a).unwrap();
        assert!(cache.get(keys::USERS).is_none());
        assert!(cache.get(&keys::item(keys::USERS, b)).is_none());
        assert!(svc.get(b).unwrap().followers.is_empty());
    }

    #[test]
    fn test_remove_queues_attachment_cleanup() {
        let (svc, db, cache, mut jobs) = service();
        let a = db.create_user("alice", "hash", true).unwrap();
        let tweet = db.create_tweet(a, "with pic").unwrap();
        let media = db.create_media("uploads/a.png").unwrap();
        db.associate_media(tweet, &[media]).unwrap();

        // Warm the tweet page so the sweep is observable.
        cache.set(keys::TWEETS, "[]");

        svc.remove(a).unwrap();

        match jobs.try_recv().unwrap() {
            Job::Delete { paths } => {
                assert_eq!(paths, vec![PathBuf::from("uploads/a.png")]);
            }
            other => panic!("expected delete job, got {:?}", other),
        }
        assert!(db.get_media(media).unwrap().is_none());
        assert!(cache.get(keys::TWEETS).is_none());
    }

    #[test]
    fn test_remove_without_attachments_submits_no_job() {
        let (svc, db, _cache, mut jobs) = service();
        let a = db.create_user("alice", "hash", true).unwrap();

        svc.remove(a).unwrap();
        assert!(jobs.try_recv().is_err());
    }
}
