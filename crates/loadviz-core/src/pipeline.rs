use std::fmt;
use std::path::PathBuf;

use crate::baseline::{run_baseline, BaselineRun, BaselineStats};
use crate::config::ReportConfig;
use crate::error::LoadvizError;
use crate::http::HttpClient;
use crate::metrics::{load_metrics, LoadTestMetrics};
use crate::report::{render_report, ReportData};
use crate::results::{write_baseline_csv, write_timeseries_csv};
use crate::summary::PerformanceSummary;
use crate::synthetic::{generate_synthetic_timeseries, SyntheticProfile};

/// Result of a full report run.
#[derive(Debug)]
pub struct RunReport {
    pub metrics: LoadTestMetrics,
    pub baseline: BaselineRun,
    pub synthetic_samples: usize,
    pub summary: PerformanceSummary,
    /// Files written, in the order they were produced.
    pub outputs: Vec<GeneratedFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub description: &'static str,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Baseline: {} probes against {} ({} to {})",
            self.baseline.samples.len(),
            self.baseline.url,
            self.baseline.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.baseline.finished_at.format("%H:%M:%S UTC"),
        )?;
        writeln!(f, "{}", self.summary)?;
        writeln!(f)?;
        writeln!(f, "Generated files:")?;
        for file in &self.outputs {
            writeln!(f, "   - {}: {}", file.path.display(), file.description)?;
        }
        Ok(())
    }
}

/// Load the metrics, measure the baseline, synthesize the series, write both
/// datasets and render the chart.
///
/// Metrics are loaded and validated before anything else happens, so an
/// input error leaves the output locations untouched.
pub async fn run(config: &ReportConfig) -> Result<RunReport, LoadvizError> {
    let metrics = load_metrics(&config.metrics_path).await?;
    tracing::info!(
        path = %config.metrics_path.display(),
        total_requests = metrics.total_requests,
        max_users = metrics.max_users,
        "loaded load test metrics"
    );

    let client = HttpClient::builder()
        .timeout(config.probe_timeout)
        .user_agent(config.user_agent.clone())
        .build()?;
    let baseline = run_baseline(
        &client,
        &config.baseline_url,
        config.baseline_probes,
        config.probe_interval,
    )
    .await;

    let profile = SyntheticProfile {
        seed: config.seed,
        ramp_up_secs: config.ramp_up_secs,
    };
    let series = generate_synthetic_timeseries(&metrics, &profile)?;

    write_baseline_csv(&config.baseline_csv, &baseline.samples)?;
    write_timeseries_csv(&config.timeseries_csv, &series)?;

    let window = config.baseline_window_secs();
    let baseline_stats = BaselineStats::compute(&baseline.samples, window);
    let data = ReportData::compute(&series, &baseline.samples, &metrics, window);

    render_report(&data, &config.chart_png, config.font_path.as_deref())?;

    let summary = PerformanceSummary::compute(&metrics, &baseline_stats);
    tracing::info!(assessment = %summary.assessment, "report complete");

    Ok(RunReport {
        synthetic_samples: series.len(),
        outputs: vec![
            GeneratedFile {
                path: config.baseline_csv.clone(),
                description: "single user baseline probes",
            },
            GeneratedFile {
                path: config.timeseries_csv.clone(),
                description: "synthetic per-request time series",
            },
            GeneratedFile {
                path: config.chart_png.clone(),
                description: "performance comparison charts",
            },
        ],
        metrics,
        baseline,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const METRICS_CSV: &str = "\
metric,value,unit
total_requests,300,count
avg_response_time,200,ms
min_response_time,50,ms
max_response_time,2000,ms
median_response_time,180,ms
p90_response_time,350,ms
p95_response_time,450,ms
p99_response_time,800,ms
success_rate,98.5,percent
throughput,25,req/s
max_users,5,users
test_duration,12,seconds
";

    fn config_in(dir: &std::path::Path) -> ReportConfig {
        ReportConfig::builder()
            .metrics_path(dir.join("k6_metrics_summary.csv"))
            // Nothing listens on port 1, so every probe fails fast.
            .baseline_url("http://127.0.0.1:1/posts")
            .baseline_probes(3)
            .probe_interval(Duration::from_millis(10))
            .probe_timeout(Duration::from_millis(500))
            .ramp_up_secs(4)
            .output_dir(dir)
            .build()
    }

    #[tokio::test]
    async fn missing_metrics_aborts_without_outputs() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let config = config_in(dir.path());

        let err = run(&config).await.unwrap_err();
        assert!(matches!(err, LoadvizError::NotFound(_)));
        assert!(err.is_input_error());
        assert!(!config.baseline_csv.exists());
        assert!(!config.timeseries_csv.exists());
        assert!(!config.chart_png.exists());
    }

    #[tokio::test]
    async fn invalid_metrics_abort_without_outputs() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let config = config_in(dir.path());
        std::fs::write(
            &config.metrics_path,
            METRICS_CSV.replace("success_rate,98.5", "success_rate,140"),
        )
        .unwrap();

        let err = run(&config).await.unwrap_err();
        assert!(err.is_input_error());
        assert!(!config.baseline_csv.exists());
    }

    #[tokio::test]
    async fn full_run_writes_all_outputs() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let config = config_in(dir.path());
        std::fs::write(&config.metrics_path, METRICS_CSV).unwrap();

        let report = run(&config).await.expect("run should succeed");

        assert_eq!(report.baseline.samples.len(), 3);
        assert_eq!(report.baseline.failed_probes(), 3);
        assert!(report.synthetic_samples > 0);
        assert_eq!(report.outputs.len(), 3);
        for file in &report.outputs {
            assert!(file.path.exists(), "{} should exist", file.path.display());
        }

        let baseline_csv = std::fs::read_to_string(&config.baseline_csv).unwrap();
        assert_eq!(baseline_csv.lines().count(), 4);
        let series_csv = std::fs::read_to_string(&config.timeseries_csv).unwrap();
        assert_eq!(series_csv.lines().count(), report.synthetic_samples + 1);

        // Every probe failed, so the baseline is all sentinel values.
        assert_eq!(report.summary.baseline.avg_response_time, 5000.0);
        assert_eq!(report.summary.baseline.success_rate, 0.0);

        let text = report.to_string();
        assert!(text.contains("PERFORMANCE TEST SUMMARY"));
        assert!(text.contains("Generated files:"));
        assert!(text.contains("k6_performance_visualizations.png: performance comparison charts"));
        assert!(text.contains("Baseline: 3 probes against http://127.0.0.1:1/posts"));
    }

    #[tokio::test]
    async fn same_seed_reproduces_series_file() {
        let dir_a = tempfile::tempdir().expect("tempdir should be created");
        let dir_b = tempfile::tempdir().expect("tempdir should be created");
        let a = config_in(dir_a.path());
        let b = config_in(dir_b.path());
        std::fs::write(&a.metrics_path, METRICS_CSV).unwrap();
        std::fs::write(&b.metrics_path, METRICS_CSV).unwrap();

        run(&a).await.expect("first run should succeed");
        run(&b).await.expect("second run should succeed");

        assert_eq!(
            std::fs::read(&a.timeseries_csv).unwrap(),
            std::fs::read(&b.timeseries_csv).unwrap()
        );
    }
}
