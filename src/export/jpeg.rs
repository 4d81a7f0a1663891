use std::fs;
use std::path::PathBuf;

use image::{ImageFormat, Rgb, RgbImage};

use super::{Chart, ChartExporter};
use crate::error::ExportError;

// ─── Layout ──────────────────────────────────────────────────────

const WIDTH: u32 = 960;
const HEIGHT: u32 = 540;
const MARGIN_LEFT: u32 = 60;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 30;
const MARGIN_BOTTOM: u32 = 50;
/// Horizontal gap between adjacent bars (px).
const BAR_GAP: u32 = 2;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const BAR: Rgb<u8> = Rgb([54, 162, 235]);

/// Writes `<dir>/<name>-hist.jpg` plus a `<name>-hist.jpg.txt` sidecar
/// holding the stats summary and bin labels.
#[derive(Debug, Clone)]
pub struct JpegChartExporter {
    dir: PathBuf,
}

impl JpegChartExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ChartExporter for JpegChartExporter {
    fn export(&self, chart: &Chart) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(&chart.filename);
        render(&chart.counts).save_with_format(&path, ImageFormat::Jpeg)?;

        let mut sidecar = path.clone().into_os_string();
        sidecar.push(".txt");
        fs::write(sidecar, caption(chart))?;

        Ok(path)
    }
}

fn caption(chart: &Chart) -> String {
    let mut out = format!("{}\n", chart.endpoint);
    for line in &chart.summary {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    for (label, count) in chart.labels.iter().zip(&chart.counts) {
        out.push_str(&format!("{label}\t{count}\n"));
    }
    out
}

/// Bar chart of `counts`, tallest bar scaled to the plot height.
fn render(counts: &[u64]) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;

    // Horizontal grid at quarters
    for q in 1..4 {
        let y = MARGIN_TOP + plot_h * q / 4;
        fill_rect(&mut img, MARGIN_LEFT, y, plot_w, 1, GRID);
    }

    let peak = counts.iter().copied().max().unwrap_or(0);
    if peak > 0 {
        let slot = plot_w as f64 / counts.len() as f64;
        for (i, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let x0 = MARGIN_LEFT + (i as f64 * slot) as u32;
            let x1 = MARGIN_LEFT + ((i + 1) as f64 * slot) as u32;
            let w = x1.saturating_sub(x0).saturating_sub(BAR_GAP).max(1);
            let h = ((count as f64 / peak as f64) * plot_h as f64).round().max(1.0) as u32;
            fill_rect(&mut img, x0, baseline - h, w, h, BAR);
        }
    }

    // Axes
    fill_rect(&mut img, MARGIN_LEFT, MARGIN_TOP, 1, plot_h + 1, AXIS);
    fill_rect(&mut img, MARGIN_LEFT, baseline, plot_w, 1, AXIS);

    img
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}
