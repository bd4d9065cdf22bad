pub mod sampler;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::ProbeResponse;
use crate::results::stats;

pub use sampler::run_baseline;

/// Latency recorded for a probe that never got a response.
pub const FAILED_PROBE_MS: f64 = 5000.0;
/// Status recorded for a probe that never got a response.
pub const FAILED_PROBE_STATUS: u16 = 500;

/// One single-user probe. Column order matches `single_user_baseline.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSample {
    /// Milliseconds.
    pub response_time: f64,
    pub status_code: u16,
    /// 1 when the endpoint answered 200, else 0.
    pub success: u8,
}

impl BaselineSample {
    pub fn from_response(resp: &ProbeResponse) -> Self {
        Self {
            response_time: resp.elapsed_ms,
            status_code: resp.status,
            success: u8::from(resp.is_ok()),
        }
    }

    /// Placeholder for a probe that failed at the transport level.
    pub fn failed() -> Self {
        Self {
            response_time: FAILED_PROBE_MS,
            status_code: FAILED_PROBE_STATUS,
            success: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success == 1
    }
}

/// A finished baseline sampling run.
#[derive(Debug, Clone)]
pub struct BaselineRun {
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub samples: Vec<BaselineSample>,
}

impl BaselineRun {
    pub fn failed_probes(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_success()).count()
    }
}

/// Reference figures derived from the baseline samples.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineStats {
    pub samples: usize,
    pub avg_response_time: f64,
    pub p95_response_time: f64,
    /// Percentage of probes that answered 200.
    pub success_rate: f64,
    /// Probes per second over the sampling window.
    pub throughput: f64,
}

impl BaselineStats {
    /// Compute the baseline figures. `window_secs` is the scheduled length of
    /// the sampling run. An empty sample set yields all zeros.
    pub fn compute(samples: &[BaselineSample], window_secs: f64) -> Self {
        let times: Vec<f64> = samples.iter().map(|s| s.response_time).collect();
        let successes = samples.iter().filter(|s| s.is_success()).count();
        let success_rate = if samples.is_empty() {
            0.0
        } else {
            successes as f64 / samples.len() as f64 * 100.0
        };
        let throughput = if window_secs > 0.0 {
            samples.len() as f64 / window_secs
        } else {
            0.0
        };

        Self {
            samples: samples.len(),
            avg_response_time: stats::mean(&times).unwrap_or(0.0),
            p95_response_time: stats::quantile(&times, 0.95).unwrap_or(0.0),
            success_rate,
            throughput,
        }
    }
}
