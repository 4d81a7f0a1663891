use serde::Serialize;

use super::record::EndpointRecord;

/// Default bucket width (ms).
pub const DEFAULT_BIN_SIZE: f64 = 25.0;

/// Upper bound on bins per histogram. Samples past the last bin are
/// clamped into it.
pub const MAX_BINS: usize = 10_000;

/// A fixed-width latency bucket. `range_end` is inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub range_start: f64,
    pub range_end: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bin_size: f64,
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    pub bins: Vec<HistogramBin>,
    pub samples: usize,
    pub max_value: f64,
}

impl Histogram {
    fn empty(bin_size: f64) -> Self {
        Self {
            bin_size,
            edges: Vec::new(),
            counts: Vec::new(),
            bins: Vec::new(),
            samples: 0,
            max_value: 0.0,
        }
    }

    /// `"<start>-<end>ms"` for each bin, in order.
    pub fn labels(&self) -> Vec<String> {
        self.bins
            .iter()
            .map(|b| format!("{}-{}ms", b.range_start, b.range_end))
            .collect()
    }
}

/// Non-finite or non-positive widths fall back to [`DEFAULT_BIN_SIZE`].
pub fn normalize_bin_size(bin_size: f64) -> f64 {
    if bin_size.is_finite() && bin_size > 0.0 {
        bin_size
    } else {
        DEFAULT_BIN_SIZE
    }
}

/// Bucket a record's samples into `bin_size`-wide bins.
///
/// A positive `max_ms` widens the range to at least that value; samples
/// beyond the last bin are clamped into it. At most [`MAX_BINS`] bins.
pub fn compute_histogram(record: &EndpointRecord, bin_size: f64, max_ms: Option<f64>) -> Histogram {
    let samples = record.response_times().to_vec();
    bucket(&samples, bin_size, max_ms)
}

pub(crate) fn bucket(samples: &[f64], bin_size: f64, max_ms: Option<f64>) -> Histogram {
    let bin_size = normalize_bin_size(bin_size);
    if samples.is_empty() {
        return Histogram::empty(bin_size);
    }

    let observed_max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_value = match max_ms.filter(|m| m.is_finite() && *m > 0.0) {
        Some(m) => m.max(observed_max),
        None => observed_max,
    };

    let wanted = ((max_value + 1.0) / bin_size).ceil();
    let bin_count = if wanted >= MAX_BINS as f64 {
        MAX_BINS
    } else {
        (wanted as usize).max(1)
    };
    let last = bin_count - 1;

    let mut counts = vec![0u64; bin_count];
    for &v in samples {
        let idx = (v / bin_size).floor();
        let idx = if idx <= 0.0 { 0 } else { (idx as usize).min(last) };
        counts[idx] += 1;
    }

    let edges: Vec<f64> = (0..bin_count).map(|i| i as f64 * bin_size).collect();
    let bins = edges
        .iter()
        .zip(&counts)
        .map(|(&start, &count)| HistogramBin {
            range_start: start,
            range_end: start + bin_size - 1.0,
            count,
        })
        .collect();

    Histogram {
        bin_size,
        edges,
        counts,
        bins,
        samples: samples.len(),
        max_value,
    }
}
