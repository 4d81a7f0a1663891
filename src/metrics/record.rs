use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sample_buffer::SampleBuffer;

/// How a single call ended, as decided by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Success,
    Failed,
    Timeout,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOutcome(pub String);

impl fmt::Display for UnknownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown outcome '{}' (expected success, failed or timeout)",
            self.0
        )
    }
}

impl std::error::Error for UnknownOutcome {}

impl FromStr for Outcome {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "timeout" => Ok(Self::Timeout),
            other => Err(UnknownOutcome(other.to_string())),
        }
    }
}

/// Counters and latency samples for one endpoint key.
///
/// `total_calls` always equals the sum of the three outcome counters,
/// including for records restored from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    total_calls: u64,
    successful_calls: u64,
    failed_calls: u64,
    timed_out_calls: u64,
    response_times: SampleBuffer,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    last_updated: DateTime<Utc>,
}

impl EndpointRecord {
    pub fn new(capacity: usize, now: DateTime<Utc>) -> Self {
        Self {
            total_calls: 0,
            successful_calls: 0,
            failed_calls: 0,
            timed_out_calls: 0,
            response_times: SampleBuffer::new(capacity),
            last_updated: now,
        }
    }

    /// Apply one event. Non-finite latencies update counters only.
    pub fn observe(&mut self, latency: Option<f64>, outcome: Outcome, now: DateTime<Utc>) {
        self.total_calls += 1;
        match outcome {
            Outcome::Success => self.successful_calls += 1,
            Outcome::Failed => self.failed_calls += 1,
            Outcome::Timeout => self.timed_out_calls += 1,
        }
        if let Some(ms) = latency.filter(|v| v.is_finite()) {
            self.response_times.push(ms);
        }
        self.last_updated = now;
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    pub fn successful_calls(&self) -> u64 {
        self.successful_calls
    }

    pub fn failed_calls(&self) -> u64 {
        self.failed_calls
    }

    pub fn timed_out_calls(&self) -> u64 {
        self.timed_out_calls
    }

    pub fn response_times(&self) -> &SampleBuffer {
        &self.response_times
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// A stored `totalCalls` that disagrees with the outcome counters is
    /// replaced by their sum.
    pub(crate) fn from_stored(stored: StoredRecord, capacity: usize, now: DateTime<Utc>) -> Self {
        let total = stored
            .successful_calls
            .saturating_add(stored.failed_calls)
            .saturating_add(stored.timed_out_calls);
        Self {
            total_calls: total,
            successful_calls: stored.successful_calls,
            failed_calls: stored.failed_calls,
            timed_out_calls: stored.timed_out_calls,
            response_times: SampleBuffer::from_samples(
                coerce_samples(stored.response_times),
                capacity,
            ),
            last_updated: stored.last_updated.unwrap_or(now),
        }
    }
}

/// Wire shape of a persisted record; tolerant of a missing or
/// malformed `responseTimes`. `totalCalls` is derived, so it is not read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredRecord {
    #[serde(default)]
    successful_calls: u64,
    #[serde(default)]
    failed_calls: u64,
    #[serde(default)]
    timed_out_calls: u64,
    #[serde(default)]
    response_times: serde_json::Value,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    last_updated: Option<DateTime<Utc>>,
}

/// Anything but an array becomes empty; non-numeric or non-finite
/// elements are dropped.
fn coerce_samples(value: serde_json::Value) -> Vec<f64> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
            .collect(),
        _ => Vec::new(),
    }
}
