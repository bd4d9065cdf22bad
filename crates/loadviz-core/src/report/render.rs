use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use crate::error::LoadvizError;

use super::panels::ReportData;

pub const REPORT_WIDTH: u32 = 2000;
pub const REPORT_HEIGHT: u32 = 2400;

const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const LOAD_COLOR: RGBColor = RGBColor(31, 119, 180);
const BASELINE_COLOR: RGBColor = RGBColor(255, 127, 14);
const USERS_COLOR: RGBColor = RGBColor(44, 160, 44);
const REFERENCE_COLOR: RGBColor = RGBColor(214, 39, 40);
const SECONDARY_COLOR: RGBColor = RGBColor(148, 103, 189);

static FONT_READY: OnceLock<bool> = OnceLock::new();

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for LoadvizError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        LoadvizError::Render(e.to_string())
    }
}

/// Render the eight-panel report to a PNG at `path`.
///
/// Text needs a TrueType font; the first call registers `font_path` or the
/// first system font found. Without one the panels are drawn unlabelled.
pub fn render_report(
    data: &ReportData,
    path: &Path,
    font_path: Option<&Path>,
) -> Result<(), LoadvizError> {
    let labels = ensure_font(font_path);
    let root = BitMapBackend::new(path, (REPORT_WIDTH, REPORT_HEIGHT)).into_drawing_area();
    draw_report(&root, data, labels)?;
    root.present()?;
    tracing::info!(path = %path.display(), labels, "rendered report");
    Ok(())
}

// Registered once per process; later calls reuse the first outcome.
fn ensure_font(custom: Option<&Path>) -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = custom
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
        for path in candidates {
            let Some(bytes) = read_font_file(&path) else {
                continue;
            };
            // Only parsed fonts reach here, so the bytes live for the process.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
                tracing::debug!(font = %path.display(), "registered chart font");
                return true;
            }
        }
        tracing::warn!("no TrueType font found, charts will be drawn without text");
        false
    })
}

/// Read `path` and keep it only if it parses as a TrueType/OpenType font.
fn read_font_file(path: &Path) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    if ab_glyph::FontRef::try_from_slice(&bytes).is_err() {
        tracing::warn!(font = %path.display(), "font file could not be parsed");
        return None;
    }
    Some(bytes)
}

/// Lay out all panels on `root`. Text is only drawn when `labels` is set.
pub fn draw_report<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    root.fill(&WHITE)?;
    let panels = if labels {
        root.titled("k6 Load Test Performance Analysis", (FONT_FAMILY, 40))?
            .split_evenly((4, 2))
    } else {
        root.split_evenly((4, 2))
    };

    response_time_panel(&panels[0], data, labels)?;
    active_users_panel(&panels[1], data, labels)?;
    distribution_panel(&panels[2], data, labels)?;
    throughput_panel(&panels[3], data, labels)?;
    percentile_panel(&panels[4], data, labels)?;
    success_rate_panel(&panels[5], data, labels)?;
    load_latency_panel(&panels[6], data, labels)?;
    comparison_panel(&panels[7], data, labels)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

fn response_time_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    let y_max = data
        .response_times
        .iter()
        .map(|&(_, rt)| rt)
        .fold(data.p95_response_time, f64::max);
    let x = time_range(data);

    let mut chart = chart_builder(area, "Response Time Over Time", labels)
        .build_cartesian_2d(x.clone(), padded(0.0, y_max))?;
    if labels {
        chart
            .configure_mesh()
            .x_desc("Time (seconds)")
            .y_desc("Response Time (ms)")
            .draw()?;
    }

    chart.draw_series(
        data.response_times
            .iter()
            .map(|&(t, rt)| Circle::new((t, rt), 2, LOAD_COLOR.mix(0.4).filled())),
    )?;
    chart
        .draw_series(LineSeries::new(
            horizontal(&x, data.avg_response_time),
            REFERENCE_COLOR.stroke_width(2),
        ))?
        .label(format!("Average: {:.1}ms", data.avg_response_time))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], REFERENCE_COLOR));
    chart
        .draw_series(LineSeries::new(
            horizontal(&x, data.p95_response_time),
            BASELINE_COLOR.stroke_width(2),
        ))?
        .label(format!("P95: {:.1}ms", data.p95_response_time))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BASELINE_COLOR));

    if labels {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn active_users_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    let y_max = data
        .users_per_second
        .iter()
        .map(|&(_, u)| u as f64)
        .fold(data.max_users as f64, f64::max);

    let mut chart = chart_builder(area, "Virtual Users Over Time", labels)
        .build_cartesian_2d(time_range(data), padded(0.0, y_max))?;
    if labels {
        chart
            .configure_mesh()
            .x_desc("Time (seconds)")
            .y_desc("Active Users")
            .draw()?;
    }

    chart.draw_series(
        AreaSeries::new(
            data.users_per_second
                .iter()
                .map(|&(sec, users)| (sec as f64, users as f64)),
            0.0,
            USERS_COLOR.mix(0.3),
        )
        .border_style(USERS_COLOR.stroke_width(2)),
    )?;
    Ok(())
}

fn distribution_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    let bins = data
        .load_histogram
        .bins
        .iter()
        .chain(data.baseline_histogram.bins.iter());
    let (x_lo, x_hi) = bins.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), b| {
        (lo.min(b.start), hi.max(b.end))
    });
    let (x_lo, x_hi) = if x_lo.is_finite() {
        (x_lo, x_hi)
    } else {
        (0.0, data.avg_response_time.max(1.0))
    };
    let y_max = data
        .load_histogram
        .max_density()
        .max(data.baseline_histogram.max_density());
    let y = padded(0.0, y_max);

    let mut chart = chart_builder(area, "Response Time Distribution", labels)
        .build_cartesian_2d(padded(x_lo, x_hi), y.clone())?;
    if labels {
        chart
            .configure_mesh()
            .x_desc("Response Time (ms)")
            .y_desc("Density")
            .y_label_formatter(&|v| format!("{v:.4}"))
            .draw()?;
    }

    chart
        .draw_series(data.load_histogram.bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.density)], LOAD_COLOR.mix(0.5).filled())
        }))?
        .label("Load Test")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], LOAD_COLOR.mix(0.5).filled()));
    chart
        .draw_series(data.baseline_histogram.bins.iter().map(|b| {
            Rectangle::new(
                [(b.start, 0.0), (b.end, b.density)],
                BASELINE_COLOR.mix(0.5).filled(),
            )
        }))?
        .label("Single User Baseline")
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 5), (x + 15, y + 5)], BASELINE_COLOR.mix(0.5).filled())
        });

    chart
        .draw_series(LineSeries::new(
            vertical(&y, data.avg_response_time),
            LOAD_COLOR.stroke_width(2),
        ))?
        .label(format!("Load Avg: {:.1}ms", data.avg_response_time))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LOAD_COLOR));
    if data.baseline.samples > 0 {
        chart
            .draw_series(LineSeries::new(
                vertical(&y, data.baseline.avg_response_time),
                BASELINE_COLOR.stroke_width(2),
            ))?
            .label(format!(
                "Baseline Avg: {:.1}ms",
                data.baseline.avg_response_time
            ))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BASELINE_COLOR));
    }

    if labels {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn throughput_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    let y_max = data
        .requests_per_second
        .iter()
        .map(|&(_, n)| n as f64)
        .fold(data.throughput, f64::max);
    let x = time_range(data);

    let mut chart = chart_builder(area, "Throughput Over Time", labels)
        .build_cartesian_2d(x.clone(), padded(0.0, y_max))?;
    if labels {
        chart
            .configure_mesh()
            .x_desc("Time (seconds)")
            .y_desc("Requests per Second")
            .draw()?;
    }

    chart.draw_series(LineSeries::new(
        data.requests_per_second
            .iter()
            .map(|&(sec, n)| (sec as f64, n as f64)),
        SECONDARY_COLOR.stroke_width(2),
    ))?;
    chart
        .draw_series(LineSeries::new(
            horizontal(&x, data.throughput),
            REFERENCE_COLOR.stroke_width(2),
        ))?
        .label(format!("Avg Throughput: {:.1} req/s", data.throughput))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], REFERENCE_COLOR));

    if labels {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn percentile_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    let names: Vec<&str> = data.percentiles.iter().map(|&(name, _)| name).collect();
    let y_max = data.percentiles.iter().map(|&(_, v)| v).fold(0.0, f64::max);
    let palette = [USERS_COLOR, LOAD_COLOR, BASELINE_COLOR, REFERENCE_COLOR];

    let mut chart = chart_builder(area, "Response Time Percentiles", labels)
        .build_cartesian_2d(bar_range(names.len()), padded(0.0, y_max))?;
    if labels {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(names.len() + 1)
            .x_label_formatter(&|x| category_label(&names, *x))
            .y_desc("Response Time (ms)")
            .draw()?;
    }

    chart.draw_series(data.percentiles.iter().enumerate().map(|(i, &(_, v))| {
        let x = i as f64;
        Rectangle::new(
            [(x - 0.35, 0.0), (x + 0.35, v)],
            palette[i % palette.len()].mix(0.8).filled(),
        )
    }))?;
    if labels {
        chart.draw_series(data.percentiles.iter().enumerate().map(|(i, &(_, v))| {
            Text::new(
                format!("{v:.0}ms"),
                (i as f64 - 0.15, v),
                (FONT_FAMILY, 18).into_font(),
            )
        }))?;
    }
    Ok(())
}

fn success_rate_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    let x = time_range(data);

    let mut chart = chart_builder(area, "Success Rate Over Time", labels)
        .build_cartesian_2d(x.clone(), data.success_axis_floor()..101.0)?;
    if labels {
        chart
            .configure_mesh()
            .x_desc("Time (seconds)")
            .y_desc("Success Rate (%)")
            .draw()?;
    }

    chart.draw_series(LineSeries::new(
        data.success_per_second
            .iter()
            .map(|&(sec, pct)| (sec as f64, pct)),
        USERS_COLOR.stroke_width(2),
    ))?;
    chart
        .draw_series(LineSeries::new(
            horizontal(&x, data.success_rate),
            REFERENCE_COLOR.stroke_width(2),
        ))?
        .label(format!("Overall: {:.2}%", data.success_rate))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], REFERENCE_COLOR));

    if labels {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn load_latency_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    let x_max = data
        .user_buckets
        .iter()
        .map(|b| b.active_users as f64)
        .fold(data.max_users as f64, f64::max);
    let y_max = data
        .user_buckets
        .iter()
        .map(|b| b.mean + b.std)
        .fold(data.baseline.avg_response_time, f64::max);
    let x = padded(0.0, x_max);

    let mut chart = chart_builder(area, "Response Time vs Load", labels)
        .build_cartesian_2d(x.clone(), padded(0.0, y_max))?;
    if labels {
        chart
            .configure_mesh()
            .x_desc("Active Users")
            .y_desc("Response Time (ms)")
            .draw()?;
    }

    chart.draw_series(data.user_buckets.iter().map(|b| {
        let users = b.active_users as f64;
        ErrorBar::new_vertical(
            users,
            (b.mean - b.std).max(0.0),
            b.mean,
            b.mean + b.std,
            LOAD_COLOR.filled(),
            8,
        )
    }))?;
    chart
        .draw_series(LineSeries::new(
            data.user_buckets
                .iter()
                .map(|b| (b.active_users as f64, b.mean)),
            LOAD_COLOR.stroke_width(2),
        ))?
        .label("Load Test (mean ± std)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LOAD_COLOR));
    chart
        .draw_series(LineSeries::new(
            horizontal(&x, data.baseline.avg_response_time),
            BASELINE_COLOR.stroke_width(2),
        ))?
        .label(format!(
            "Baseline: {:.1}ms",
            data.baseline.avg_response_time
        ))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BASELINE_COLOR));

    if labels {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn comparison_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &ReportData,
    labels: bool,
) -> Result<(), LoadvizError> {
    let names: Vec<&str> = data.comparison.iter().map(|b| b.label).collect();
    let y_max = data
        .comparison
        .iter()
        .map(|b| b.baseline.max(b.load))
        .fold(0.0, f64::max);

    let mut chart = chart_builder(area, "Baseline vs Load Test Comparison", labels)
        .build_cartesian_2d(bar_range(names.len()), padded(0.0, y_max))?;
    if labels {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(names.len() + 1)
            .x_label_formatter(&|x| category_label(&names, *x))
            .y_desc("Value")
            .draw()?;
    }

    chart
        .draw_series(data.comparison.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.38, 0.0), (x, b.baseline)],
                BASELINE_COLOR.mix(0.8).filled(),
            )
        }))?
        .label("Single User Baseline")
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 5), (x + 15, y + 5)], BASELINE_COLOR.mix(0.8).filled())
        });
    chart
        .draw_series(data.comparison.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new([(x, 0.0), (x + 0.38, b.load)], LOAD_COLOR.mix(0.8).filled())
        }))?
        .label(format!("{} Concurrent Users", data.max_users))
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 5), (x + 15, y + 5)], LOAD_COLOR.mix(0.8).filled())
        });

    if labels {
        chart.draw_series(comparison_annotations(data).into_iter().map(|(x, y, text)| {
            Text::new(text, (x, y), (FONT_FAMILY, 16).into_font())
        }))?;
        draw_legend(&mut chart)?;
    }
    Ok(())
}

// Value labels anchored at the top-left of each comparison bar.
fn comparison_annotations(data: &ReportData) -> Vec<(f64, f64, String)> {
    data.comparison
        .iter()
        .enumerate()
        .flat_map(|(i, b)| {
            let x = i as f64;
            [
                (x - 0.34, b.baseline, format!("{:.1}", b.baseline)),
                (x + 0.04, b.load, format!("{:.1}", b.load)),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn chart_builder<'a, 'b, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    title: &str,
    labels: bool,
) -> ChartBuilder<'a, 'b, DB> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(20);
    if labels {
        builder
            .caption(title, (FONT_FAMILY, 28))
            .x_label_area_size(50)
            .y_label_area_size(80);
    }
    builder
}

fn draw_legend<'a, DB: DrawingBackend + 'a>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
) -> Result<(), LoadvizError> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font((FONT_FAMILY, 18))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Widen `lo..hi` by 5% on top, or to a unit range when it is degenerate.
fn padded(lo: f64, hi: f64) -> Range<f64> {
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        let lo = if lo.is_finite() { lo } else { 0.0 };
        return lo..lo + 1.0;
    }
    lo..hi + (hi - lo) * 0.05
}

fn time_range(data: &ReportData) -> Range<f64> {
    0.0..(data.duration_secs.max(1)) as f64
}

// Categories sit on integer positions 0..n.
fn bar_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

fn category_label(names: &[&str], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    names.get(idx as usize).map(|s| s.to_string()).unwrap_or_default()
}

fn horizontal(x: &Range<f64>, y: f64) -> Vec<(f64, f64)> {
    vec![(x.start, y), (x.end, y)]
}

fn vertical(y: &Range<f64>, x: f64) -> Vec<(f64, f64)> {
    vec![(x, y.start), (x, y.end)]
}
