use std::collections::VecDeque;

use serde::{Serialize, Serializer};

/// Upper bound on retained latency samples per endpoint.
pub const MAX_SAMPLES: usize = 2000;

/// Bounded FIFO of latency samples (ms), oldest evicted first.
///
/// Callers only push finite values; validation lives in
/// `MetricsStore::record_event`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Builds a buffer from stored samples, keeping only the newest
    /// `capacity` of them.
    pub fn from_samples(samples: Vec<f64>, capacity: usize) -> Self {
        let mut buf = Self::new(capacity);
        let skip = samples.len().saturating_sub(buf.capacity);
        buf.samples.extend(samples.into_iter().skip(skip));
        buf
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(MAX_SAMPLES)
    }
}

impl Serialize for SampleBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.samples.iter())
    }
}
