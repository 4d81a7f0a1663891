//! Histogram chart export.
//!
//! The store hands out plain data ([`ChartJob`]); rendering happens
//! outside the store lock through a [`ChartExporter`]. Batches run one
//! endpoint at a time and never stop at the first failure.

pub mod jpeg;

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ExportError;
use crate::metrics::{Histogram, MetricsStore, StatsSnapshot};

pub use jpeg::JpegChartExporter;

/// Renders one chart and writes it somewhere durable.
pub trait ChartExporter: Send + Sync {
    /// Returns the path of the written image.
    fn export(&self, chart: &Chart) -> Result<PathBuf, ExportError>;
}

/// Everything a renderer needs for one endpoint's bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub endpoint: String,
    pub filename: String,
    /// x-axis, `"<start>-<end>ms"`
    pub labels: Vec<String>,
    /// y-axis
    pub counts: Vec<u64>,
    pub summary: Vec<String>,
}

impl Chart {
    pub fn new(endpoint: &str, histogram: &Histogram, stats: &StatsSnapshot) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            filename: export_filename(endpoint),
            labels: histogram.labels(),
            counts: histogram.counts.clone(),
            summary: summary_lines(stats),
        }
    }
}

/// `roads/v2` → `roads_v2-hist.jpg`
pub fn export_filename(endpoint: &str) -> String {
    let stem: String = endpoint
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}-hist.jpg")
}

/// Human-readable stats block printed next to the chart.
pub fn summary_lines(stats: &StatsSnapshot) -> Vec<String> {
    let ms = |v: Option<f64>| match v {
        Some(v) => format!("{}ms", v.round() as i64),
        None => "-".to_string(),
    };
    let pct = |r: f64| format!("{}%", (r * 100.0).round() as i64);

    vec![
        format!("samples: {}", stats.samples),
        format!("mean: {}", ms(stats.mean)),
        format!(
            "p5: {}  p20: {}  p80: {}  p95: {}",
            ms(stats.p5),
            ms(stats.p20),
            ms(stats.p80),
            ms(stats.p95)
        ),
        format!(
            "success: {}  failure: {}  timeout: {}",
            pct(stats.success_rate),
            pct(stats.failure_rate),
            pct(stats.timeout_rate)
        ),
    ]
}

// ─── Jobs & reports ──────────────────────────────────────────────

/// Histogram + stats for one endpoint, detached from the store.
#[derive(Debug, Clone)]
pub struct ChartJob {
    pub endpoint: String,
    pub histogram: Histogram,
    pub stats: StatsSnapshot,
}

impl ChartJob {
    pub fn from_store(store: &MetricsStore, endpoint: &str, bin_size: f64) -> Result<Self, ExportError> {
        let stats = store
            .snapshot(endpoint)
            .ok_or_else(|| ExportError::UnknownEndpoint(endpoint.to_string()))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            histogram: store.histogram(endpoint, bin_size, None),
            stats,
        })
    }

    /// One job per known endpoint, in key order.
    pub fn all_from_store(store: &MetricsStore, bin_size: f64) -> Vec<Self> {
        store
            .all_snapshots()
            .into_iter()
            .map(|s| Self {
                histogram: store.histogram(&s.endpoint, bin_size, None),
                endpoint: s.endpoint,
                stats: s.stats,
            })
            .collect()
    }

    pub fn run(self, exporter: &dyn ChartExporter) -> Result<ExportReport, ExportError> {
        let chart = Chart::new(&self.endpoint, &self.histogram, &self.stats);
        let path = exporter.export(&chart)?;
        info!(endpoint = %self.endpoint, path = %path.display(), "histogram exported");
        Ok(ExportReport {
            ok: true,
            filename: chart.filename,
            histogram: self.histogram,
            stats: self.stats,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub ok: bool,
    pub filename: String,
    pub histogram: Histogram,
    pub stats: StatsSnapshot,
}

/// One row of a batch export; exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct BatchExportEntry {
    pub endpoint: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExportReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn export_histogram(
    store: &MetricsStore,
    exporter: &dyn ChartExporter,
    endpoint: &str,
    bin_size: f64,
) -> Result<ExportReport, ExportError> {
    ChartJob::from_store(store, endpoint, bin_size)?.run(exporter)
}

pub fn export_all_histograms(
    store: &MetricsStore,
    exporter: &dyn ChartExporter,
    bin_size: f64,
) -> Vec<BatchExportEntry> {
    run_batch(exporter, ChartJob::all_from_store(store, bin_size))
}

/// Export each job in turn, collecting every outcome.
pub fn run_batch(exporter: &dyn ChartExporter, jobs: Vec<ChartJob>) -> Vec<BatchExportEntry> {
    jobs.into_iter()
        .map(|job| {
            let endpoint = job.endpoint.clone();
            match job.run(exporter) {
                Ok(report) => BatchExportEntry {
                    endpoint,
                    ok: true,
                    result: Some(report),
                    error: None,
                },
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "histogram export failed");
                    BatchExportEntry {
                        endpoint,
                        ok: false,
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect()
}
