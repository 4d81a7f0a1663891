use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use endpoint_latency::error::PersistError;
use endpoint_latency::metrics::{
    EndpointKeyResolver, LoadOutcome, MetricsStore, Outcome, StoreConfig, MAX_SAMPLES,
};
use endpoint_latency::persistence::{KeyValueStore, MemoryStore, PersistenceAdapter};

const KEY: &str = "metrics-under-test";

fn store_on(backend: &Arc<MemoryStore>, config: StoreConfig) -> MetricsStore {
    MetricsStore::new(
        config,
        EndpointKeyResolver::default(),
        Some(PersistenceAdapter::new(backend.clone(), KEY)),
    )
}

fn ts(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

#[test]
fn test_save_then_load_round_trip() {
    let backend = Arc::new(MemoryStore::new());
    let mut a = store_on(&backend, StoreConfig::default());
    a.record_event_at("/wms?LAYERS=roads", Some(12.5), Outcome::Success, ts(1_000));
    a.record_event_at("/wms?LAYERS=roads", None, Outcome::Timeout, ts(2_000));
    a.record_event_at("/tiles/elevation", Some(80.0), Outcome::Failed, ts(3_000));
    a.save().unwrap();

    let mut b = store_on(&backend, StoreConfig::default());
    assert_eq!(b.load().unwrap(), LoadOutcome::Loaded { endpoints: 2 });

    for key in ["roads", "elevation"] {
        assert_eq!(a.get(key), b.get(key), "record for {key} differs");
    }
    assert_eq!(b.get("roads").unwrap().last_updated(), ts(2_000));
    assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
}

#[test]
fn test_auto_save_every_tenth_call_per_endpoint() {
    let backend = Arc::new(MemoryStore::new());
    let mut store = store_on(&backend, StoreConfig::default());

    for _ in 0..9 {
        store.record_event("/tiles/a", Some(1.0), Outcome::Success);
        store.record_event("/tiles/b", Some(1.0), Outcome::Success);
    }
    assert_eq!(backend.writes(), 0);

    store.record_event("/tiles/a", Some(1.0), Outcome::Success);
    assert_eq!(backend.writes(), 1);

    // The save covers the whole store, not just the endpoint that hit ten
    let payload = backend.get(KEY).unwrap().unwrap();
    let v: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(v["a"]["totalCalls"], 10);
    assert_eq!(v["b"]["totalCalls"], 9);

    store.record_event("/tiles/b", Some(1.0), Outcome::Success);
    assert_eq!(backend.writes(), 2);
}

#[test]
fn test_auto_save_disabled_with_zero_cadence() {
    let backend = Arc::new(MemoryStore::new());
    let config = StoreConfig {
        persist_every: 0,
        ..StoreConfig::default()
    };
    let mut store = store_on(&backend, config);
    for _ in 0..30 {
        store.record_event("/tiles/a", Some(1.0), Outcome::Success);
    }
    assert_eq!(backend.writes(), 0);
}

#[test]
fn test_unavailable_storage_never_disrupts_recording() {
    let backend = Arc::new(MemoryStore::new());
    backend.set_unavailable(true);
    let mut store = store_on(&backend, StoreConfig::default());

    for i in 0..25 {
        store.record_event("/tiles/a", Some(i as f64), Outcome::Success);
    }
    assert_eq!(store.snapshot("a").unwrap().total_calls, 25);
    assert!(matches!(store.load(), Err(PersistError::Storage(_))));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_load_truncates_and_coerces_buffers() {
    let backend = Arc::new(MemoryStore::new());
    let long: Vec<usize> = (0..MAX_SAMPLES + 10).collect();
    let payload = serde_json::json!({
        "long":    { "totalCalls": 1, "successfulCalls": 1, "responseTimes": long },
        "missing": { "totalCalls": 3, "failedCalls": 3 },
        "broken":  { "totalCalls": 1, "timedOutCalls": 1, "responseTimes": { "0": 5 } },
    });
    backend.set(KEY, &payload.to_string()).unwrap();

    let mut store = store_on(&backend, StoreConfig::default());
    assert_eq!(store.load().unwrap(), LoadOutcome::Loaded { endpoints: 3 });

    let long = store.get("long").unwrap().response_times();
    assert_eq!(long.len(), MAX_SAMPLES);
    assert_eq!(long.iter().next(), Some(10.0));
    assert_eq!(long.iter().last(), Some((MAX_SAMPLES + 9) as f64));

    assert!(store.get("missing").unwrap().response_times().is_empty());
    assert!(store.get("broken").unwrap().response_times().is_empty());
    assert_eq!(store.snapshot("broken").unwrap().timed_out_calls, 1);
}

#[test]
fn test_clear_persist_overwrites_durable_snapshot() {
    let backend = Arc::new(MemoryStore::new());
    let mut store = store_on(&backend, StoreConfig::default());
    store.record_event("/tiles/a", Some(1.0), Outcome::Success);
    store.save().unwrap();
    store.clear(true).unwrap();

    let mut fresh = store_on(&backend, StoreConfig::default());
    assert_eq!(fresh.load().unwrap(), LoadOutcome::Loaded { endpoints: 0 });
    assert!(fresh.is_empty());
}

#[test]
fn test_random_events_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(42);
    let config = StoreConfig {
        max_samples: 64,
        ..StoreConfig::default()
    };
    let mut store = MetricsStore::new(config, EndpointKeyResolver::default(), None);
    let ids = ["/t/a", "/t/b?layer=c", "https://h.example", "bad id"];
    let mut recent: std::collections::HashMap<String, Vec<f64>> = Default::default();

    for _ in 0..5_000 {
        let id = ids[rng.gen_range(0..ids.len())];
        let latency = match rng.gen_range(0..10) {
            0 => None,
            1 => Some(f64::NAN),
            _ => Some(rng.gen_range(0.0..500.0)),
        };
        let outcome = match rng.gen_range(0..3) {
            0 => Outcome::Success,
            1 => Outcome::Failed,
            _ => Outcome::Timeout,
        };
        let key = store.record_event(id, latency, outcome);
        if let Some(v) = latency.filter(|v| v.is_finite()) {
            recent.entry(key).or_default().push(v);
        }
    }

    assert_eq!(store.endpoints(), vec!["a", "bad id", "c", "h.example"]);
    for key in store.endpoints() {
        let rec = store.get(&key).unwrap();
        assert_eq!(
            rec.total_calls(),
            rec.successful_calls() + rec.failed_calls() + rec.timed_out_calls()
        );
        assert!(rec.response_times().len() <= 64);

        let all = &recent[&key];
        let tail = &all[all.len().saturating_sub(64)..];
        assert_eq!(rec.response_times().to_vec(), tail);

        let h = store.histogram(&key, 25.0, None);
        assert_eq!(h.counts.iter().sum::<u64>() as usize, rec.response_times().len());
    }
}
