use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::EndpointRecord;

/// Linear interpolation between closest ranks.
///
/// `p` is clamped to `[0, 1]`; `p = 0` is the minimum, `p = 1` the
/// maximum. The input is never reordered.
pub fn percentile(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(percentile_sorted(&sorted, p))
}

/// Same as [`percentile`] for input that is already sorted ascending.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    let idx = (sorted.len() - 1) as f64 * p;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (idx - lo as f64)
}

/// Descriptive statistics for one endpoint at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub timed_out_calls: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub timeout_rate: f64,
    pub samples: usize,
    pub mean: Option<f64>,
    pub p5: Option<f64>,
    pub p20: Option<f64>,
    pub p80: Option<f64>,
    pub p95: Option<f64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

/// Pure read of a record; nothing is mutated.
pub fn compute_snapshot(record: &EndpointRecord) -> StatsSnapshot {
    let total = record.total_calls();
    let rate = |n: u64| {
        if total == 0 {
            0.0
        } else {
            n as f64 / total as f64
        }
    };

    let mut sorted = record.response_times().to_vec();
    sorted.sort_by(f64::total_cmp);

    let (mean, p5, p20, p80, p95) = if sorted.is_empty() {
        (None, None, None, None, None)
    } else {
        let mean = record.response_times().iter().sum::<f64>() / sorted.len() as f64;
        (
            Some(mean),
            Some(percentile_sorted(&sorted, 0.05)),
            Some(percentile_sorted(&sorted, 0.20)),
            Some(percentile_sorted(&sorted, 0.80)),
            Some(percentile_sorted(&sorted, 0.95)),
        )
    };

    StatsSnapshot {
        total_calls: total,
        successful_calls: record.successful_calls(),
        failed_calls: record.failed_calls(),
        timed_out_calls: record.timed_out_calls(),
        success_rate: rate(record.successful_calls()),
        failure_rate: rate(record.failed_calls()),
        timeout_rate: rate(record.timed_out_calls()),
        samples: sorted.len(),
        mean,
        p5,
        p20,
        p80,
        p95,
        last_updated: record.last_updated(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::record::Outcome;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(percentile(&[], 0.0), None);
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(percentile(&[], 1.0), None);
    }

    #[test]
    fn endpoints_are_min_and_max() {
        let s = [40.0, 10.0, 30.0, 20.0];
        assert_eq!(percentile(&s, 0.0), Some(10.0));
        assert_eq!(percentile(&s, 1.0), Some(40.0));
    }

    #[test]
    fn interpolates_between_ranks() {
        // sorted [10, 20, 30, 40], n=4
        // p=0.5 → idx 1.5 → 20 + 10*0.5 = 25
        // p=0.2 → idx 0.6 → 10 + 10*0.6 = 16
        let s = [40.0, 10.0, 30.0, 20.0];
        assert!(approx(percentile(&s, 0.5).unwrap(), 25.0));
        assert!(approx(percentile(&s, 0.2).unwrap(), 16.0));
    }

    #[test]
    fn integer_index_returns_element() {
        // n=5, p=0.25 → idx exactly 1
        let s = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&s, 0.25), Some(2.0));
    }

    #[test]
    fn does_not_mutate_input() {
        let s = vec![5.0, 1.0, 4.0, 2.0];
        let before = s.clone();
        let _ = percentile(&s, 0.8);
        assert_eq!(s, before);
    }

    #[test]
    fn snapshot_of_empty_record_has_zero_rates() {
        let rec = EndpointRecord::new(10, Utc::now());
        let snap = compute_snapshot(&rec);
        assert_eq!(snap.total_calls, 0);
        assert_eq!(snap.success_rate, 0.0);
        assert_eq!(snap.failure_rate, 0.0);
        assert_eq!(snap.timeout_rate, 0.0);
        assert_eq!(snap.samples, 0);
        assert_eq!(snap.mean, None);
        assert_eq!(snap.p95, None);
    }

    #[test]
    fn mean_sums_in_arrival_order() {
        // Sorted order would be [-1e16, 1, 1e16], which loses the 1
        let now = Utc::now();
        let mut rec = EndpointRecord::new(10, now);
        for v in [1e16, -1e16, 1.0] {
            rec.observe(Some(v), Outcome::Success, now);
        }
        assert_eq!(compute_snapshot(&rec).mean, Some(1.0 / 3.0));
    }

    #[test]
    fn snapshot_rates_and_percentiles() {
        let now = Utc::now();
        let mut rec = EndpointRecord::new(100, now);
        for v in [10.0, 20.0, 30.0, 40.0, 50.0] {
            rec.observe(Some(v), Outcome::Success, now);
        }
        rec.observe(None, Outcome::Failed, now);
        rec.observe(None, Outcome::Timeout, now);
        rec.observe(None, Outcome::Timeout, now);

        let snap = compute_snapshot(&rec);
        assert_eq!(snap.total_calls, 8);
        assert!(approx(snap.success_rate, 5.0 / 8.0));
        assert!(approx(snap.failure_rate, 1.0 / 8.0));
        assert!(approx(snap.timeout_rate, 2.0 / 8.0));
        assert_eq!(snap.samples, 5);
        assert_eq!(snap.mean, Some(30.0));
        // idx = 4p
        assert!(approx(snap.p5.unwrap(), 12.0));
        assert!(approx(snap.p20.unwrap(), 18.0));
        assert!(approx(snap.p80.unwrap(), 42.0));
        assert!(approx(snap.p95.unwrap(), 48.0));
    }
}
