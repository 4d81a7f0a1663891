pub mod endpoint_key;
pub mod histogram;
pub mod percentiles;
pub mod record;
pub mod sample_buffer;
pub mod store;
pub mod stream;

pub use endpoint_key::EndpointKeyResolver;
pub use histogram::{compute_histogram, Histogram, HistogramBin, DEFAULT_BIN_SIZE, MAX_BINS};
pub use percentiles::{compute_snapshot, percentile, StatsSnapshot};
pub use record::{EndpointRecord, Outcome};
pub use sample_buffer::{SampleBuffer, MAX_SAMPLES};
pub use store::{EndpointStats, LoadOutcome, MetricsStore, StoreConfig};
