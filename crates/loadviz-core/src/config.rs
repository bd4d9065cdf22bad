use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_METRICS_FILE: &str = "k6_metrics_summary.csv";
pub const DEFAULT_BASELINE_URL: &str = "https://jsonplaceholder.typicode.com/posts";
pub const DEFAULT_BASELINE_CSV: &str = "single_user_baseline.csv";
pub const DEFAULT_TIMESERIES_CSV: &str = "k6_timeseries_data.csv";
pub const DEFAULT_CHART_PNG: &str = "k6_performance_visualizations.png";

/// Everything a report run needs to know up front.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub metrics_path: PathBuf,
    pub baseline_url: String,
    pub baseline_probes: u32,
    /// Target spacing between probe starts.
    pub probe_interval: Duration,
    pub probe_timeout: Duration,
    pub user_agent: String,
    pub seed: u64,
    pub ramp_up_secs: u64,
    pub baseline_csv: PathBuf,
    pub timeseries_csv: PathBuf,
    pub chart_png: PathBuf,
    /// TrueType font for chart text. When unset, common system locations
    /// are searched.
    pub font_path: Option<PathBuf>,
}

impl ReportConfig {
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::new()
    }

    /// Seconds covered by the baseline schedule, used as the denominator of
    /// baseline throughput.
    pub fn baseline_window_secs(&self) -> f64 {
        self.baseline_probes as f64 * self.probe_interval.as_secs_f64()
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfigBuilder::default().build()
    }
}

/// Builder for [`ReportConfig`].
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl Default for ReportConfigBuilder {
    fn default() -> Self {
        Self {
            config: ReportConfig {
                metrics_path: PathBuf::from(DEFAULT_METRICS_FILE),
                baseline_url: DEFAULT_BASELINE_URL.to_string(),
                baseline_probes: 60,
                probe_interval: Duration::from_secs(1),
                probe_timeout: Duration::from_secs(10),
                user_agent: format!("loadviz/{}", env!("CARGO_PKG_VERSION")),
                seed: 42,
                ramp_up_secs: 30,
                baseline_csv: PathBuf::from(DEFAULT_BASELINE_CSV),
                timeseries_csv: PathBuf::from(DEFAULT_TIMESERIES_CSV),
                chart_png: PathBuf::from(DEFAULT_CHART_PNG),
                font_path: None,
            },
        }
    }
}

impl ReportConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.metrics_path = path.into();
        self
    }

    pub fn baseline_url(mut self, url: impl Into<String>) -> Self {
        self.config.baseline_url = url.into();
        self
    }

    pub fn baseline_probes(mut self, n: u32) -> Self {
        self.config.baseline_probes = n;
        self
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.config.probe_interval = interval;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn ramp_up_secs(mut self, secs: u64) -> Self {
        self.config.ramp_up_secs = secs;
        self
    }

    /// Place all three output files under `dir`, keeping their default names.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.config.baseline_csv = dir.join(DEFAULT_BASELINE_CSV);
        self.config.timeseries_csv = dir.join(DEFAULT_TIMESERIES_CSV);
        self.config.chart_png = dir.join(DEFAULT_CHART_PNG);
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn build(self) -> ReportConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = ReportConfig::default();
        assert_eq!(config.metrics_path, PathBuf::from("k6_metrics_summary.csv"));
        assert_eq!(config.baseline_url, DEFAULT_BASELINE_URL);
        assert_eq!(config.baseline_probes, 60);
        assert_eq!(config.probe_interval, Duration::from_secs(1));
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.seed, 42);
        assert_eq!(config.ramp_up_secs, 30);
        assert!(config.user_agent.starts_with("loadviz/"));
        assert!(config.font_path.is_none());
    }

    #[test]
    fn default_output_paths_are_relative_file_names() {
        let config = ReportConfig::default();
        assert_eq!(config.baseline_csv, PathBuf::from("single_user_baseline.csv"));
        assert_eq!(config.timeseries_csv, PathBuf::from("k6_timeseries_data.csv"));
        assert_eq!(
            config.chart_png,
            PathBuf::from("k6_performance_visualizations.png")
        );
    }

    #[test]
    fn builder_chaining_all_options() {
        let config = ReportConfig::builder()
            .metrics_path("/tmp/metrics.csv")
            .baseline_url("http://127.0.0.1:8080/health")
            .baseline_probes(5)
            .probe_interval(Duration::from_millis(20))
            .probe_timeout(Duration::from_secs(2))
            .user_agent("loadviz-test")
            .seed(7)
            .ramp_up_secs(10)
            .font_path("/usr/share/fonts/custom.ttf")
            .build();
        assert_eq!(config.metrics_path, PathBuf::from("/tmp/metrics.csv"));
        assert_eq!(config.baseline_url, "http://127.0.0.1:8080/health");
        assert_eq!(config.baseline_probes, 5);
        assert_eq!(config.probe_interval, Duration::from_millis(20));
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "loadviz-test");
        assert_eq!(config.seed, 7);
        assert_eq!(config.ramp_up_secs, 10);
        assert_eq!(
            config.font_path.as_deref(),
            Some(std::path::Path::new("/usr/share/fonts/custom.ttf"))
        );
    }

    #[test]
    fn output_dir_rewrites_all_outputs() {
        let config = ReportConfig::builder().output_dir("/tmp/out").build();
        assert_eq!(
            config.baseline_csv,
            PathBuf::from("/tmp/out/single_user_baseline.csv")
        );
        assert_eq!(
            config.timeseries_csv,
            PathBuf::from("/tmp/out/k6_timeseries_data.csv")
        );
        assert_eq!(
            config.chart_png,
            PathBuf::from("/tmp/out/k6_performance_visualizations.png")
        );
    }

    #[test]
    fn baseline_window_is_probes_times_interval() {
        let config = ReportConfig::default();
        assert!((config.baseline_window_secs() - 60.0).abs() < 1e-9);

        let config = ReportConfig::builder()
            .baseline_probes(10)
            .probe_interval(Duration::from_millis(500))
            .build();
        assert!((config.baseline_window_secs() - 5.0).abs() < 1e-9);
    }
}
