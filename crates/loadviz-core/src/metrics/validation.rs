use crate::error::LoadvizError;
use crate::metrics::LoadTestMetrics;

/// Validate typed metrics and return every problem found.
///
/// An empty `Vec` means the metrics are usable by the generator.
pub fn validate_metrics(m: &LoadTestMetrics) -> Vec<LoadvizError> {
    let mut errors = Vec::new();

    let non_negative = [
        ("avg_response_time", m.avg_response_time),
        ("min_response_time", m.min_response_time),
        ("max_response_time", m.max_response_time),
        ("median_response_time", m.median_response_time),
        ("p90_response_time", m.p90_response_time),
        ("p95_response_time", m.p95_response_time),
        ("p99_response_time", m.p99_response_time),
        ("throughput", m.throughput),
        ("test_duration", m.test_duration),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            errors.push(LoadvizError::InvalidMetric(format!(
                "{name} must be a finite, non-negative number (got {value})"
            )));
        }
    }

    if !(0.0..=100.0).contains(&m.success_rate) {
        errors.push(LoadvizError::InvalidMetric(format!(
            "success_rate must be a percentage between 0 and 100 (got {})",
            m.success_rate
        )));
    }

    if m.min_response_time > m.p95_response_time {
        errors.push(LoadvizError::InvalidMetric(format!(
            "min_response_time ({}) exceeds p95_response_time ({})",
            m.min_response_time, m.p95_response_time
        )));
    }

    if m.p95_response_time > m.max_response_time {
        errors.push(LoadvizError::InvalidMetric(format!(
            "p95_response_time ({}) exceeds max_response_time ({})",
            m.p95_response_time, m.max_response_time
        )));
    }

    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
