use std::path::PathBuf;

use magpie_api::state::ServiceConfig;

/// Process configuration, read once at startup from the environment
/// (`.env` is loaded first if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub seed_demo: bool,
    pub service: ServiceConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("MAGPIE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("MAGPIE_PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()?;
        let db_path = std::env::var("MAGPIE_DB_PATH").unwrap_or_else(|_| "magpie.db".into());
        let seed_demo = std::env::var("MAGPIE_SEED_DEMO")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let jwt_secret =
            std::env::var("MAGPIE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
        let token_expire_minutes: i64 = std::env::var("MAGPIE_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|_| "30".into())
            .parse()?;
        let media_dir = std::env::var("MAGPIE_MEDIA_DIR").unwrap_or_else(|_| "uploads".into());
        let max_attachments: usize = std::env::var("MAGPIE_MAX_ATTACHMENTS")
            .unwrap_or_else(|_| "10".into())
            .parse()?;
        let max_file_bytes: usize = std::env::var("MAGPIE_MAX_FILE_BYTES")
            .unwrap_or_else(|_| (5 * 1024 * 1024).to_string())
            .parse()?;

        Ok(Self {
            host,
            port,
            db_path: PathBuf::from(db_path),
            seed_demo,
            service: ServiceConfig {
                jwt_secret,
                token_expire_minutes,
                media_dir: PathBuf::from(media_dir),
                max_attachments,
                max_file_bytes,
            },
        })
    }
}
