use std::collections::BTreeMap;

use crate::baseline::{BaselineSample, BaselineStats};
use crate::metrics::LoadTestMetrics;
use crate::results::stats;
use crate::synthetic::SyntheticRequestSample;

/// Bins used for the synthetic and baseline latency histograms.
pub const LOAD_HISTOGRAM_BINS: usize = 50;
pub const BASELINE_HISTOGRAM_BINS: usize = 30;
/// User buckets with fewer samples are left out of the load/latency panel.
pub const MIN_BUCKET_SAMPLES: usize = 5;

/// One bar of a density histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    /// `count / (total * width)`, so the bars integrate to 1.
    pub density: f64,
}

/// Density histogram with equal-width bins over the data range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins. The last bin is closed on
    /// the right. A single distinct value gets a unit-wide range around it.
    pub fn density(values: &[f64], bins: usize) -> Self {
        if values.is_empty() || bins == 0 {
            return Self::default();
        }
        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi <= lo {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let total = values.len() as f64;
        Self {
            bins: counts
                .into_iter()
                .enumerate()
                .map(|(i, count)| HistogramBin {
                    start: lo + i as f64 * width,
                    end: lo + (i + 1) as f64 * width,
                    density: count as f64 / (total * width),
                })
                .collect(),
        }
    }

    pub fn max_density(&self) -> f64 {
        self.bins.iter().map(|b| b.density).fold(0.0, f64::max)
    }
}

/// Latency statistics of all synthetic requests sharing an active-user count.
#[derive(Debug, Clone, PartialEq)]
pub struct UserBucket {
    pub active_users: u64,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

/// One metric of the baseline vs. load grouped bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonBar {
    pub label: &'static str,
    pub baseline: f64,
    pub load: f64,
}

/// Everything the eight report panels plot, computed up front so drawing is
/// pure layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    /// Length of the synthetic run in whole seconds.
    pub duration_secs: u64,
    pub max_users: u64,

    // 1. response time over time
    pub response_times: Vec<(f64, f64)>,
    pub avg_response_time: f64,
    pub p95_response_time: f64,

    // 2. active users over time
    pub users_per_second: Vec<(u64, u64)>,

    // 3. latency distributions
    pub load_histogram: Histogram,
    pub baseline_histogram: Histogram,
    pub baseline: BaselineStats,

    // 4. throughput over time
    pub requests_per_second: Vec<(u64, u64)>,
    pub throughput: f64,

    // 5. percentiles
    pub percentiles: Vec<(&'static str, f64)>,

    // 6. success rate over time
    pub success_per_second: Vec<(u64, f64)>,
    pub success_rate: f64,

    // 7. latency by load
    pub user_buckets: Vec<UserBucket>,

    // 8. baseline vs load
    pub comparison: Vec<ComparisonBar>,
}

impl ReportData {
    pub fn compute(
        series: &[SyntheticRequestSample],
        baseline_samples: &[BaselineSample],
        metrics: &LoadTestMetrics,
        baseline_window_secs: f64,
    ) -> Self {
        let baseline = BaselineStats::compute(baseline_samples, baseline_window_secs);
        let per_second = group_by_second(series);

        let load_times: Vec<f64> = series.iter().map(|s| s.response_time).collect();
        let baseline_times: Vec<f64> = baseline_samples.iter().map(|s| s.response_time).collect();

        let comparison = vec![
            ComparisonBar {
                label: "Avg Response Time (ms)",
                baseline: baseline.avg_response_time,
                load: metrics.avg_response_time,
            },
            ComparisonBar {
                label: "P95 Response Time (ms)",
                baseline: baseline.p95_response_time,
                load: metrics.p95_response_time,
            },
            ComparisonBar {
                label: "Throughput (req/s)",
                baseline: baseline.throughput,
                load: metrics.throughput,
            },
            ComparisonBar {
                label: "Success Rate (%)",
                baseline: baseline.success_rate,
                load: metrics.success_rate,
            },
        ];

        Self {
            duration_secs: metrics.test_duration.floor().max(0.0) as u64,
            max_users: metrics.max_users,
            response_times: series
                .iter()
                .map(|s| (s.time_seconds, s.response_time))
                .collect(),
            avg_response_time: metrics.avg_response_time,
            p95_response_time: metrics.p95_response_time,
            users_per_second: per_second
                .iter()
                .map(|(&sec, samples)| (sec, samples[0].active_users))
                .collect(),
            load_histogram: Histogram::density(&load_times, LOAD_HISTOGRAM_BINS),
            baseline_histogram: Histogram::density(&baseline_times, BASELINE_HISTOGRAM_BINS),
            baseline,
            requests_per_second: per_second
                .iter()
                .map(|(&sec, samples)| (sec, samples.len() as u64))
                .collect(),
            throughput: metrics.throughput,
            percentiles: vec![
                ("P50", metrics.median_response_time),
                ("P90", metrics.p90_response_time),
                ("P95", metrics.p95_response_time),
                ("P99", metrics.p99_response_time),
            ],
            success_per_second: per_second
                .iter()
                .map(|(&sec, samples)| {
                    let ok = samples.iter().filter(|s| s.success == 1).count();
                    (sec, ok as f64 / samples.len() as f64 * 100.0)
                })
                .collect(),
            success_rate: metrics.success_rate,
            user_buckets: user_buckets(series),
            comparison,
        }
    }

    /// Lower bound of the success-rate axis: five points under the overall
    /// rate, never below zero.
    pub fn success_axis_floor(&self) -> f64 {
        (self.success_rate - 5.0).max(0.0)
    }
}

// Samples keyed by whole second; every entry is non-empty.
fn group_by_second(series: &[SyntheticRequestSample]) -> BTreeMap<u64, Vec<&SyntheticRequestSample>> {
    let mut buckets: BTreeMap<u64, Vec<&SyntheticRequestSample>> = BTreeMap::new();
    for s in series {
        buckets
            .entry(s.time_seconds.floor() as u64)
            .or_default()
            .push(s);
    }
    buckets
}

fn user_buckets(series: &[SyntheticRequestSample]) -> Vec<UserBucket> {
    let mut by_users: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
    for s in series {
        by_users
            .entry(s.active_users)
            .or_default()
            .push(s.response_time);
    }
    by_users
        .into_iter()
        .filter(|(_, times)| times.len() >= MIN_BUCKET_SAMPLES)
        .map(|(active_users, times)| UserBucket {
            active_users,
            mean: stats::mean(&times).unwrap_or(0.0),
            std: stats::sample_std(&times).unwrap_or(0.0),
            count: times.len(),
        })
        .collect()
}
