use std::sync::Arc;

use parking_lot::Mutex;

pub mod config;
pub mod demo;
pub mod error;
pub mod export;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod persistence;
pub mod server;

use export::ChartExporter;
use metrics::MetricsStore;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// The single metrics store; handlers record into it, SSE reads snapshots.
    pub store: Arc<Mutex<MetricsStore>>,

    /// Renders histogram charts for the export endpoints.
    pub exporter: Arc<dyn ChartExporter>,

    /// Bin width used when a request does not pass `binSize`.
    pub default_bin_size: f64,
}

impl AppState {
    pub fn new(store: MetricsStore, exporter: Arc<dyn ChartExporter>, default_bin_size: f64) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            exporter,
            default_bin_size: metrics::histogram::normalize_bin_size(default_bin_size),
        }
    }
}
