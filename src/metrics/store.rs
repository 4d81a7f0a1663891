use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::endpoint_key::EndpointKeyResolver;
use super::histogram::{compute_histogram, Histogram};
use super::percentiles::{compute_snapshot, StatsSnapshot};
use super::record::{EndpointRecord, Outcome, StoredRecord};
use super::sample_buffer::MAX_SAMPLES;
use crate::error::PersistError;
use crate::persistence::PersistenceAdapter;

// ─── Configuration ───────────────────────────────────────────────

/// A full save is triggered whenever an endpoint's `total_calls` hits a
/// multiple of this.
pub const DEFAULT_PERSIST_EVERY: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Per-endpoint sample buffer capacity.
    pub max_samples: usize,
    /// Auto-save cadence; 0 disables auto-save.
    pub persist_every: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_samples: MAX_SAMPLES,
            persist_every: DEFAULT_PERSIST_EVERY,
        }
    }
}

// ─── Public types ────────────────────────────────────────────────

/// One entry of [`MetricsStore::all_snapshots`].
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub stats: StatsSnapshot,
}

/// What a successful load found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LoadOutcome {
    /// Nothing persisted yet; in-memory state untouched.
    Absent,
    /// `endpoints` records overwrote their in-memory counterparts.
    Loaded { endpoints: usize },
}

/// Endpoint key → record, plus the persistence it saves into.
///
/// Single owner; the HTTP layer wraps it in a mutex.
#[derive(Debug)]
pub struct MetricsStore {
    records: BTreeMap<String, EndpointRecord>,
    resolver: EndpointKeyResolver,
    persistence: Option<PersistenceAdapter>,
    config: StoreConfig,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(StoreConfig::default(), EndpointKeyResolver::default(), None)
    }
}

// ─── MetricsStore impl ───────────────────────────────────────────

impl MetricsStore {
    pub fn new(
        config: StoreConfig,
        resolver: EndpointKeyResolver,
        persistence: Option<PersistenceAdapter>,
    ) -> Self {
        Self {
            records: BTreeMap::new(),
            resolver,
            persistence,
            config,
        }
    }

    pub fn resolve_endpoint_key(&self, raw_id: &str) -> String {
        self.resolver.resolve(raw_id)
    }

    /// Record a single call observation. Never fails; storage problems
    /// during the periodic save are logged and dropped.
    ///
    /// Returns the endpoint key the event was grouped under.
    pub fn record_event(&mut self, raw_id: &str, latency: Option<f64>, outcome: Outcome) -> String {
        self.record_event_at(raw_id, latency, outcome, Utc::now())
    }

    pub fn record_event_at(
        &mut self,
        raw_id: &str,
        latency: Option<f64>,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> String {
        let key = self.resolver.resolve(raw_id);
        let capacity = self.config.max_samples;

        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| EndpointRecord::new(capacity, now));
        record.observe(latency, outcome, now);
        let total = record.total_calls();

        debug!(endpoint = %key, ?latency, %outcome, total, "event recorded");

        let every = self.config.persist_every;
        if self.persistence.is_some() && every > 0 && total % every == 0 {
            if let Err(e) = self.save() {
                warn!(endpoint = %key, error = %e, kind = e.kind(), "periodic metrics save failed");
            }
        }
        key
    }

    pub fn get(&self, endpoint: &str) -> Option<&EndpointRecord> {
        self.records.get(endpoint)
    }

    /// Known endpoint keys, sorted.
    pub fn endpoints(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn snapshot(&self, endpoint: &str) -> Option<StatsSnapshot> {
        self.records.get(endpoint).map(compute_snapshot)
    }

    pub fn all_snapshots(&self) -> Vec<EndpointStats> {
        self.records
            .iter()
            .map(|(endpoint, rec)| EndpointStats {
                endpoint: endpoint.clone(),
                stats: compute_snapshot(rec),
            })
            .collect()
    }

    /// Unknown endpoints get the empty histogram shape.
    pub fn histogram(&self, endpoint: &str, bin_size: f64, max_ms: Option<f64>) -> Histogram {
        let empty = EndpointRecord::new(1, Utc::now());
        let record = self.records.get(endpoint).unwrap_or(&empty);
        compute_histogram(record, bin_size, max_ms)
    }

    /// Drop every endpoint; with `persist`, overwrite the durable snapshot
    /// with the now-empty store.
    pub fn clear(&mut self, persist: bool) -> Result<(), PersistError> {
        let dropped = self.records.len();
        self.records.clear();
        info!(endpoints = dropped, persist, "metrics cleared");
        if persist {
            self.save()?;
        }
        Ok(())
    }

    /// The JSON payload that `save` writes.
    pub fn to_json(&self) -> Result<String, PersistError> {
        serde_json::to_string(&self.records).map_err(PersistError::Serialize)
    }

    /// Serialize the whole store and hand it to the persistence backend.
    pub fn save(&self) -> Result<(), PersistError> {
        let adapter = self.persistence.as_ref().ok_or(PersistError::Disabled)?;
        let payload = self.to_json()?;
        adapter.save(&payload)?;
        debug!(endpoints = self.records.len(), bytes = payload.len(), "metrics saved");
        Ok(())
    }

    /// Overwrite in-memory records with the persisted ones, key by key.
    /// Any failure leaves the in-memory state exactly as it was.
    pub fn load(&mut self) -> Result<LoadOutcome, PersistError> {
        let payload = match &self.persistence {
            Some(adapter) => adapter.load()?,
            None => return Err(PersistError::Disabled),
        };
        match payload {
            None => {
                debug!("no persisted metrics");
                Ok(LoadOutcome::Absent)
            }
            Some(payload) => {
                let endpoints = self.merge_json(&payload)?;
                info!(endpoints, "persisted metrics loaded");
                Ok(LoadOutcome::Loaded { endpoints })
            }
        }
    }

    /// Apply a serialized snapshot (the format `to_json` produces).
    /// Returns the number of endpoint records applied.
    pub fn merge_json(&mut self, payload: &str) -> Result<usize, PersistError> {
        let parsed: HashMap<String, StoredRecord> =
            serde_json::from_str(payload).map_err(PersistError::CorruptPayload)?;

        let now = Utc::now();
        let capacity = self.config.max_samples;
        let count = parsed.len();
        for (key, stored) in parsed {
            self.records
                .insert(key, EndpointRecord::from_stored(stored, capacity, now));
        }
        Ok(count)
    }
}
