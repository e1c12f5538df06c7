use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use magpie_cache::{Cache, keys};
use magpie_db::Database;
use magpie_db::models::LikeOutcome;
use magpie_queue::OffloadQueue;
use magpie_types::api::default_limit;
use magpie_types::models::TweetDetail;

use super::snapshot;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::ServiceConfig;

const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Tweet orchestration: cache-through reads, write-warm creation,
/// author-only deletion with media cleanup, like/unlike.
///
/// Invariant on every mutation: the persistence write commits before any
/// cache key is invalidated, so a concurrent reader can never repopulate
/// the cache with pre-mutation data after the invalidation.
#[derive(Clone)]
pub struct TweetService {
    db: Arc<Database>,
    cache: Arc<dyn Cache>,
    queue: OffloadQueue,
    media_dir: PathBuf,
    max_attachments: usize,
    max_file_bytes: usize,
}

impl TweetService {
    pub fn new(
        db: Arc<Database>,
        cache: Arc<dyn Cache>,
        queue: OffloadQueue,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            db,
            cache,
            queue,
            media_dir: config.media_dir.clone(),
            max_attachments: config.max_attachments,
            max_file_bytes: config.max_file_bytes,
        }
    }

    /// Create a tweet, optionally attaching previously uploaded media.
    /// All referenced media must exist and be unattached.
    pub fn create(
        &self,
        author_id: i64,
        content: &str,
        media_ids: &[i64],
    ) -> Result<i64, ApiError> {
        if !media_ids.is_empty() {
            if media_ids.len() > self.max_attachments {
                return Err(ApiError::CreateConflict);
            }
            if self.db.count_unattached(media_ids)? != media_ids.len() {
                return Err(ApiError::CreateConflict);
            }
        }

        let tweet_id = self.db.create_tweet(author_id, content)?;
        if !media_ids.is_empty() {
            self.db.associate_media(tweet_id, media_ids)?;
        }

        // Warm the item cache: the full projection is already at hand.
        if let Some(detail) = self.db.tweet_detail(tweet_id)? {
            self.cache
                .set(&keys::item(keys::TWEETS, tweet_id), &snapshot(&detail)?);
        }
        self.cache.delete(keys::TWEETS);

        Ok(tweet_id)
    }

    /// Cache-through single-tweet read. Absence is not an error here;
    /// callers decide what a missing tweet means.
    pub fn get(&self, tweet_id: i64) -> Result<Option<TweetDetail>, ApiError> {
        let key = keys::item(keys::TWEETS, tweet_id);
        if let Some(cached) = self.cache.get(&key) {
            if let Ok(detail) = serde_json::from_str(&cached) {
                return Ok(Some(detail));
            }
            // Undecodable entry: drop it and fall through to the store.
            self.cache.delete(&key);
        }

        let detail = self.db.tweet_detail(tweet_id)?;
        if let Some(detail) = &detail {
            self.cache.set(&key, &snapshot(detail)?);
        }
        Ok(detail)
    }

    /// Cache-through listing. Only the default first page is served from
    /// the collection key; any mutation invalidates that key wholesale.
    pub fn get_all(&self, skip: u32, limit: u32) -> Result<Vec<TweetDetail>, ApiError> {
        let default_page = skip == 0 && limit == default_limit();
        if default_page {
            if let Some(cached) = self.cache.get(keys::TWEETS) {
                if let Ok(page) = serde_json::from_str(&cached) {
                    return Ok(page);
                }
                self.cache.delete(keys::TWEETS);
            }
        }

        let page = self.db.tweet_page(skip, limit)?;
        if default_page && !page.is_empty() {
            self.cache.set(keys::TWEETS, &snapshot(&page)?);
        }
        Ok(page)
    }

    /// Delete a tweet. Author-only. Attached media rows are removed and
    /// their files handed to the offload queue; the physical delete is
    /// never awaited.
    pub fn remove(&self, tweet_id: i64, user: &CurrentUser) -> Result<(), ApiError> {
        let tweet = self.db.get_tweet(tweet_id)?.ok_or(ApiError::TweetNotFound)?;
        if tweet.author_id != user.id {
            return Err(ApiError::NotAllowed);
        }

        let paths = self.db.media_paths_for_tweet(tweet_id)?;
        if !paths.is_empty() {
            self.db.remove_media_for_tweet(tweet_id)?;
            self.queue
                .submit_delete(paths.iter().map(PathBuf::from).collect());
            debug!("Queued {} media files for deletion", paths.len());
        }

        self.db.remove_tweet(tweet_id)?;

        // Invalidate only after the row is gone.
        self.cache.delete(keys::TWEETS);
        self.cache.delete(&keys::item(keys::TWEETS, tweet_id));
        Ok(())
    }

    pub fn create_like(&self, tweet_id: i64, user_id: i64) -> Result<(), ApiError> {
        match self.db.create_like(user_id, tweet_id)? {
            LikeOutcome::TweetMissing => Err(ApiError::TweetNotFound),
            LikeOutcome::Created | LikeOutcome::AlreadyLiked => {
                self.cache.delete(keys::TWEETS);
                self.cache.delete(&keys::item(keys::TWEETS, tweet_id));
                Ok(())
            }
        }
    }

    /// Unlike. A missing like maps to `TweetNotFound` — "nothing to
    /// unlike" shares the error kind with a vanished tweet.
    pub fn remove_like(&self, tweet_id: i64, user_id: i64) -> Result<(), ApiError> {
        if !self.db.check_like(user_id, tweet_id)? {
            return Err(ApiError::TweetNotFound);
        }
        self.db.remove_like(user_id, tweet_id)?;

        self.cache.delete(keys::TWEETS);
        self.cache.delete(&keys::item(keys::TWEETS, tweet_id));
        Ok(())
    }

    /// Register an upload: validate, create the media row, hand the bytes
    /// to the offload queue. Returns the media id immediately; the disk
    /// write is eventually consistent with respect to it.
    pub fn add_media(&self, filename: &str, bytes: Vec<u8>) -> Result<i64, ApiError> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or(ApiError::WrongFileKind)?;
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ApiError::WrongFileKind);
        }
        if bytes.len() > self.max_file_bytes {
            return Err(ApiError::FileTooLarge);
        }

        let path = self.media_dir.join(format!("{}.{}", Uuid::new_v4(), ext));
        let media_id = self.db.create_media(&path.to_string_lossy())?;
        self.queue.submit_write(bytes, path);

        Ok(media_id)
    }
}
