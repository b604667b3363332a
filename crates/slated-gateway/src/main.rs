use std::net::SocketAddr;
use std::sync::Arc;

use slated_core::config::{SlatedConfig, StoreBackend};
use slated_executor::{Executor, HttpExecutor};
use slated_scheduler::{DispatchEngine, SchedulerHandle};
use slated_store::{ActionStore, MemoryStore, SqliteStore};
use tracing::info;

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slated_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit SLATED_CONFIG path > ~/.slated/slated.toml
    let config_path = std::env::var("SLATED_CONFIG").ok();
    let config = SlatedConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        SlatedConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let store: Arc<dyn ActionStore> = match config.store.backend {
        StoreBackend::Memory => {
            info!("using in-memory store — scheduled actions die with the process");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite => {
            ensure_parent_dir(&config.store.path);
            info!(path = %config.store.path, "opening kv database");
            Arc::new(SqliteStore::open(&config.store.path)?)
        }
    };

    if config.board.api_key.is_empty() {
        tracing::warn!("board.api_key is empty — the board API will reject executions");
    }
    let executor: Arc<dyn Executor> = Arc::new(HttpExecutor::new(
        config.board.base_url.clone(),
        config.board.api_key.clone(),
    ));

    let retention = config.scheduler.retention();
    let scheduler = SchedulerHandle::new(Arc::clone(&store), retention);
    let dispatcher = Arc::new(DispatchEngine::new(
        Arc::clone(&store),
        executor,
        retention,
        config.scheduler.sweep_period(),
    ));

    let state = Arc::new(app::AppState::new(
        config,
        store,
        scheduler,
        Arc::clone(&dispatcher),
    ));
    let router = app::build_router(Arc::clone(&state));

    // spawn the dispatcher loop in background
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move { dispatcher.run(shutdown_rx).await });

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("slated gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal dispatcher to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
