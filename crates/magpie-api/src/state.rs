use std::path::PathBuf;
use std::sync::Arc;

use magpie_cache::Cache;
use magpie_db::Database;
use magpie_queue::OffloadQueue;

use crate::service::tweets::TweetService;
use crate::service::users::UserService;

/// Settings the service layer needs; owned by the transport layer and
/// passed in explicitly, never read from globals.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub jwt_secret: String,
    pub token_expire_minutes: i64,
    pub media_dir: PathBuf,
    pub max_attachments: usize,
    pub max_file_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".to_string(),
            token_expire_minutes: 30,
            media_dir: PathBuf::from("uploads"),
            max_attachments: 10,
            max_file_bytes: 5 * 1024 * 1024,
        }
    }
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub tweets: TweetService,
    pub users: UserService,
    pub config: ServiceConfig,
}

impl AppStateInner {
    pub fn new(
        db: Arc<Database>,
        cache: Arc<dyn Cache>,
        queue: OffloadQueue,
        config: ServiceConfig,
    ) -> Self {
        let users = UserService::new(db.clone(), cache.clone(), queue.clone());
        let tweets = TweetService::new(db.clone(), cache, queue, &config);
        Self {
            db,
            tweets,
            users,
            config,
        }
    }
}
