use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::metrics::endpoint_key::DEFAULT_BASE_URL;
use crate::metrics::store::DEFAULT_PERSIST_EVERY;
use crate::metrics::{StoreConfig, DEFAULT_BIN_SIZE, MAX_SAMPLES};
use crate::persistence::DEFAULT_STORAGE_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    Redis,
    /// Nothing survives a restart.
    Memory,
}

/// Per-endpoint HTTP latency aggregation service.
#[derive(Debug, Clone, Parser)]
#[command(name = "endpoint-latency", version, about)]
pub struct Config {
    /// Address the HTTP API listens on.
    #[arg(long, env = "ENDPOINT_LATENCY_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Where the metrics snapshot is persisted.
    #[arg(long, env = "ENDPOINT_LATENCY_STORAGE", value_enum, default_value_t = StorageKind::Redis)]
    pub storage: StorageKind,

    #[arg(long, env = "ENDPOINT_LATENCY_REDIS_URL", default_value = "redis://127.0.0.1:6379/")]
    pub redis_url: String,

    /// Key the snapshot is stored under.
    #[arg(long, env = "ENDPOINT_LATENCY_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY)]
    pub storage_key: String,

    /// Base URL that relative request ids are resolved against.
    #[arg(long, env = "ENDPOINT_LATENCY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Latency samples kept per endpoint, capped at 2000.
    #[arg(long, env = "ENDPOINT_LATENCY_MAX_SAMPLES", default_value_t = MAX_SAMPLES)]
    pub max_samples: usize,

    /// Save the whole store every N calls to one endpoint (0 = never).
    #[arg(long, env = "ENDPOINT_LATENCY_PERSIST_EVERY", default_value_t = DEFAULT_PERSIST_EVERY)]
    pub persist_every: u64,

    /// Directory histogram images are written to.
    #[arg(long, env = "ENDPOINT_LATENCY_EXPORT_DIR", default_value = "exports")]
    pub export_dir: PathBuf,

    /// Default histogram bin width (ms).
    #[arg(long, env = "ENDPOINT_LATENCY_BIN_SIZE", default_value_t = DEFAULT_BIN_SIZE)]
    pub bin_size: f64,

    /// Record this many synthetic events at startup.
    #[arg(long, default_value_t = 0)]
    pub seed_demo: usize,
}

impl Config {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_samples: self.max_samples.clamp(1, MAX_SAMPLES),
            persist_every: self.persist_every,
        }
    }
}
