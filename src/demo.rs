use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::info;

use crate::metrics::{MetricsStore, Outcome};

// ─── Synthetic traffic ───────────────────────────────────────────

/// Request ids covering every key-derivation path.
static REQUEST_IDS: &[&str] = &[
    "/geoserver/wms?SERVICE=WMS&REQUEST=GetMap&LAYERS=roads",
    "/geoserver/wms?SERVICE=WMS&REQUEST=GetMap&LAYERS=parcels",
    "/geoserver/wms?service=WMS&layers=water",
    "/tiles/v1/elevation",
    "/tiles/v1/landcover/",
    "https://cdn.example.org",
];

/// Typical latency (ms) per request id, same order as `REQUEST_IDS`.
static BASE_LATENCY_MS: &[f64] = &[40.0, 120.0, 65.0, 210.0, 90.0, 15.0];

/// Latency above which a call is reported as a timeout.
const TIMEOUT_MS: f64 = 600.0;

/// Record `count` events with a deterministic RNG so demo runs are comparable.
pub fn seed(store: &mut MetricsStore, count: usize) {
    if count == 0 {
        return;
    }
    let t0 = Instant::now();
    let mut rng = StdRng::seed_from_u64(1000);

    for _ in 0..count {
        let i = rng.gen_range(0..REQUEST_IDS.len());
        // Long right tail: base * (1 + exp-ish jitter)
        let jitter: f64 = -rng.gen_range(f64::EPSILON..1.0f64).ln();
        let latency = BASE_LATENCY_MS[i] * (0.5 + jitter);

        let (latency, outcome) = if latency > TIMEOUT_MS {
            (None, Outcome::Timeout)
        } else if rng.gen_bool(0.03) {
            (Some(latency), Outcome::Failed)
        } else {
            (Some(latency), Outcome::Success)
        };
        store.record_event(REQUEST_IDS[i], latency, outcome);
    }

    info!(
        events = count,
        endpoints = store.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "demo events seeded"
    );
}
