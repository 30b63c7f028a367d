#[macro_use]
extern crate log;

use posts_api::backend::{CacheBackend, InMemoryBackend};
use posts_api::config::{AppConfig, CacheConfig, StoreConfig};
use posts_api::http::{router, AppState};
use posts_api::observability::LogMetrics;
use posts_api::repository::{
    postgres, InMemoryPostStore, InMemoryUserStore, PgPostStore, PgUserStore, PostCache,
    PostStore, UserStore,
};
use posts_api::service::{PostService, UserService};
use posts_api::{Error, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load `.env` before the logger so RUST_LOG can come from the file
    dotenv::dotenv().ok();

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run().await {
        error!("posts-api failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;
    info!("Starting posts-api v{}", posts_api::VERSION);

    let (post_store, user_store): (Arc<dyn PostStore>, Arc<dyn UserStore>) = match &config.store
    {
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            let pool = postgres::connect(url, *max_connections).await?;
            (
                Arc::new(PgPostStore::new(pool.clone())),
                Arc::new(PgUserStore::new(pool)),
            )
        }
        StoreConfig::Memory => {
            warn!("Using in-memory store: data is lost on restart");
            (
                Arc::new(InMemoryPostStore::new()),
                Arc::new(InMemoryUserStore::new()),
            )
        }
    };

    match &config.cache {
        CacheConfig::InMemory => {
            info!("✓ In-memory cache backend initialized");
            serve(&config, InMemoryBackend::new(), post_store, user_store).await
        }
        #[cfg(feature = "redis")]
        CacheConfig::Redis { url, pool_size } => {
            let backend = posts_api::backend::RedisBackend::new(posts_api::backend::RedisConfig {
                url: url.clone(),
                pool_size: *pool_size,
                ..Default::default()
            })?;
            serve(&config, backend, post_store, user_store).await
        }
        #[cfg(not(feature = "redis"))]
        CacheConfig::Redis { .. } => Err(Error::NotImplemented(
            "CACHE_BACKEND=redis requires the `redis` feature".to_string(),
        )),
    }
}

async fn serve<B: CacheBackend>(
    config: &AppConfig,
    backend: B,
    post_store: Arc<dyn PostStore>,
    user_store: Arc<dyn UserStore>,
) -> Result<()> {
    if !backend.health_check().await.unwrap_or(false) {
        warn!("Cache backend is not reachable yet; requests will fail until it is");
    }

    let cache = PostCache::new(backend).with_metrics(Arc::new(LogMetrics));
    let posts = PostService::new(post_store, cache, user_store.clone());
    let users = UserService::new(user_store);
    let app = router(AppState::new(posts, users));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| Error::ConfigError(format!("Cannot bind {}: {}", address, e)))?;
    info!("🚀 Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("SIGTERM received, shutting down");
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
