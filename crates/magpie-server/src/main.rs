mod config;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use magpie_api::state::AppStateInner;
use magpie_cache::{Cache, MemoryCache};
use magpie_queue::OffloadQueue;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "magpie=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(magpie_db::Database::open(&config.db_path)?);

    if config.seed_demo {
        seed::demo_users(&db)?;
    }

    // Offload worker runs for the lifetime of the process.
    let (queue, jobs) = OffloadQueue::channel();
    tokio::spawn(magpie_queue::run_worker(jobs));

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let state = Arc::new(AppStateInner::new(
        db,
        cache,
        queue,
        config.service.clone(),
    ));

    let app = magpie_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Magpie server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
