use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use endpoint_latency::config::{Config, StorageKind};
use endpoint_latency::export::JpegChartExporter;
use endpoint_latency::metrics::{EndpointKeyResolver, MetricsStore};
use endpoint_latency::persistence::{KeyValueStore, MemoryStore, PersistenceAdapter, RedisStore};
use endpoint_latency::{demo, server, AppState};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,endpoint_latency=debug".into()),
        )
        .init();

    let config = Config::parse();

    // ── 1. Storage backend ───────────────────────────────────────
    let backend: Option<Arc<dyn KeyValueStore>> = match config.storage {
        StorageKind::Memory => Some(Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>),
        StorageKind::Redis => match RedisStore::open(&config.redis_url) {
            Ok(store) => Some(Arc::new(store) as Arc<dyn KeyValueStore>),
            Err(e) => {
                warn!(error = %e, "persistence disabled");
                None
            }
        },
    };
    let persistence = backend.map(|b| PersistenceAdapter::new(b, config.storage_key.clone()));
    info!(storage = ?config.storage, key = %config.storage_key, "storage configured");

    // ── 2. Build the store and reload the last snapshot ──────────
    let mut store = MetricsStore::new(
        config.store_config(),
        EndpointKeyResolver::new(Some(config.base_url.as_str())),
        persistence,
    );
    let seed_count = config.seed_demo;
    let store = tokio::task::spawn_blocking(move || {
        if let Err(e) = store.load() {
            warn!(error = %e, kind = e.kind(), "starting with empty metrics");
        }
        demo::seed(&mut store, seed_count);
        store
    })
    .await
    .map_err(std::io::Error::other)?;

    // ── 3. Shared state & router ─────────────────────────────────
    let exporter = Arc::new(JpegChartExporter::new(config.export_dir.clone()));
    let state = Arc::new(AppState::new(store, exporter, config.bin_size));
    let app = server::create_router(state.clone());

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, "listening");
    info!("Metrics JSON    → http://{}/api/metrics", config.listen);
    info!("Metrics SSE     → http://{}/api/metrics/stream", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // ── 5. Final save so nothing since the last periodic one is lost
    let store = state.store.clone();
    let saved = tokio::task::spawn_blocking(move || store.lock().save())
        .await
        .map_err(std::io::Error::other)?;
    match saved {
        Ok(()) => info!("metrics saved on shutdown"),
        Err(e) => warn!(error = %e, kind = e.kind(), "final metrics save failed"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
