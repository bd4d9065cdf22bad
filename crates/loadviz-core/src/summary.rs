use std::fmt;

use crate::baseline::BaselineStats;
use crate::metrics::{LoadTestMetrics, RequestTimings};

/// Qualitative verdict on a load test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    Excellent,
    Good,
    NeedsImprovement,
}

impl Assessment {
    /// EXCELLENT needs more than 99% success and a P95 under 500 ms; GOOD
    /// needs more than 95% success.
    pub fn classify(success_rate: f64, p95_response_time: f64) -> Self {
        if success_rate > 99.0 && p95_response_time < 500.0 {
            Assessment::Excellent
        } else if success_rate > 95.0 {
            Assessment::Good
        } else {
            Assessment::NeedsImprovement
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Assessment::Excellent => "EXCELLENT",
            Assessment::Good => "GOOD",
            Assessment::NeedsImprovement => "NEEDS IMPROVEMENT",
        };
        write!(f, "{s}")
    }
}

/// Headline comparison of the load test against the single-user baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub total_requests: u64,
    pub failed_requests: Option<u64>,
    pub success_rate: f64,
    pub avg_response_time: f64,
    pub p95_response_time: f64,
    pub throughput: f64,
    pub baseline: BaselineStats,
    /// `(load avg / baseline avg - 1) * 100`; `None` without a usable baseline.
    pub response_time_impact_pct: Option<f64>,
    /// Load throughput divided by baseline throughput.
    pub throughput_multiplier: Option<f64>,
    pub timings: RequestTimings,
    pub assessment: Assessment,
}

impl PerformanceSummary {
    pub fn compute(metrics: &LoadTestMetrics, baseline: &BaselineStats) -> Self {
        let response_time_impact_pct = (baseline.avg_response_time > 0.0)
            .then(|| (metrics.avg_response_time / baseline.avg_response_time - 1.0) * 100.0);
        let throughput_multiplier =
            (baseline.throughput > 0.0).then(|| metrics.throughput / baseline.throughput);

        Self {
            total_requests: metrics.total_requests,
            failed_requests: metrics.failed_requests,
            success_rate: metrics.success_rate,
            avg_response_time: metrics.avg_response_time,
            p95_response_time: metrics.p95_response_time,
            throughput: metrics.throughput,
            baseline: baseline.clone(),
            response_time_impact_pct,
            throughput_multiplier,
            timings: metrics.timings.clone(),
            assessment: Assessment::classify(metrics.success_rate, metrics.p95_response_time),
        }
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "PERFORMANCE TEST SUMMARY")?;
        writeln!(f, "{rule}")?;

        writeln!(f, "Load Test Results:")?;
        match self.failed_requests {
            Some(failed) => writeln!(
                f,
                "   - Total Requests: {} ({} failed)",
                group_thousands(self.total_requests),
                group_thousands(failed)
            )?,
            None => writeln!(
                f,
                "   - Total Requests: {}",
                group_thousands(self.total_requests)
            )?,
        }
        writeln!(f, "   - Success Rate: {:.2}%", self.success_rate)?;
        writeln!(f, "   - Avg Response Time: {:.1}ms", self.avg_response_time)?;
        writeln!(f, "   - 95th Percentile: {:.1}ms", self.p95_response_time)?;
        writeln!(f, "   - Throughput: {:.1} req/s", self.throughput)?;

        if !self.timings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Request Timing Breakdown:")?;
            for (label, value) in self.timings.entries() {
                if let Some(ms) = value {
                    writeln!(f, "   - {label}: {ms:.2}ms")?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Baseline Comparison:")?;
        match self.response_time_impact_pct {
            Some(pct) => writeln!(f, "   - Response Time Impact: {pct:+.1}%")?,
            None => writeln!(f, "   - Response Time Impact: n/a")?,
        }
        match self.throughput_multiplier {
            Some(x) => writeln!(f, "   - Throughput Improvement: {x:.1}x")?,
            None => writeln!(f, "   - Throughput Improvement: n/a")?,
        }
        writeln!(
            f,
            "   - Baseline Avg Response: {:.1}ms",
            self.baseline.avg_response_time
        )?;
        writeln!(
            f,
            "   - Baseline Success Rate: {:.1}%",
            self.baseline.success_rate
        )?;

        writeln!(f)?;
        write!(f, "Assessment: {}", self.assessment)
    }
}

/// `1234567` -> `"1,234,567"`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
