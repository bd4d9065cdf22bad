pub mod loader;
pub mod validation;

use std::collections::BTreeMap;

use crate::error::LoadvizError;

pub use loader::load_metrics;
pub use validation::validate_metrics;

/// One row of the k6 summary export.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    pub value: f64,
    pub unit: String,
}

/// Metric name to value, as read from the summary file.
pub type MetricMap = BTreeMap<String, MetricValue>;

/// Aggregate statistics of a finished load test.
///
/// Built once from a [`MetricMap`]; every field the generator, renderer and
/// summary need is required, the extra k6 timings are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTestMetrics {
    pub total_requests: u64,
    pub avg_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub median_response_time: f64,
    pub p90_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
    /// Requests per second.
    pub throughput: f64,
    pub max_users: u64,
    /// Seconds.
    pub test_duration: f64,
    pub failed_requests: Option<u64>,
    pub timings: RequestTimings,
}

/// Average per-phase request timings (ms) exported by k6, when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTimings {
    pub blocked: Option<f64>,
    pub connecting: Option<f64>,
    pub tls_handshaking: Option<f64>,
    pub sending: Option<f64>,
    pub waiting: Option<f64>,
    pub receiving: Option<f64>,
}

impl RequestTimings {
    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_none())
    }

    /// Labelled phases in request order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("Blocked", self.blocked),
            ("Connecting", self.connecting),
            ("TLS Handshake", self.tls_handshaking),
            ("Sending", self.sending),
            ("Waiting", self.waiting),
            ("Receiving", self.receiving),
        ]
    }
}

impl LoadTestMetrics {
    /// Type the raw metric map, failing on the first required metric that is
    /// absent.
    pub fn from_map(map: &MetricMap) -> Result<Self, LoadvizError> {
        Ok(Self {
            total_requests: count(map, "total_requests")?,
            avg_response_time: required(map, "avg_response_time")?,
            min_response_time: required(map, "min_response_time")?,
            max_response_time: required(map, "max_response_time")?,
            median_response_time: required(map, "median_response_time")?,
            p90_response_time: required(map, "p90_response_time")?,
            p95_response_time: required(map, "p95_response_time")?,
            p99_response_time: required(map, "p99_response_time")?,
            success_rate: required(map, "success_rate")?,
            throughput: required(map, "throughput")?,
            max_users: count(map, "max_users")?,
            test_duration: required(map, "test_duration")?,
            failed_requests: optional(map, "failed_requests")
                .map(|v| to_count("failed_requests", v))
                .transpose()?,
            timings: RequestTimings {
                blocked: optional(map, "avg_blocked_time"),
                connecting: optional(map, "avg_connecting_time"),
                tls_handshaking: optional(map, "avg_tls_handshake_time"),
                sending: optional(map, "avg_sending_time"),
                waiting: optional(map, "avg_waiting_time"),
                receiving: optional(map, "avg_receiving_time"),
            },
        })
    }
}

fn required(map: &MetricMap, name: &str) -> Result<f64, LoadvizError> {
    map.get(name)
        .map(|m| m.value)
        .ok_or_else(|| LoadvizError::MissingMetric(name.to_string()))
}

fn optional(map: &MetricMap, name: &str) -> Option<f64> {
    map.get(name).map(|m| m.value)
}

fn count(map: &MetricMap, name: &str) -> Result<u64, LoadvizError> {
    to_count(name, required(map, name)?)
}

// Counts are exported as plain numbers; fractional parts are dropped.
fn to_count(name: &str, value: f64) -> Result<u64, LoadvizError> {
    if !value.is_finite() || value < 0.0 {
        return Err(LoadvizError::InvalidMetric(format!(
            "{name} must be a non-negative count (got {value})"
        )));
    }
    Ok(value.trunc() as u64)
}
