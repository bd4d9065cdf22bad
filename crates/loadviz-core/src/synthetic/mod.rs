//! Synthetic per-request time series.
//!
//! k6 only hands back aggregates, so the per-request view the charts need is
//! reconstructed here: a linear user ramp drives how many requests land in
//! each second, latencies come from a 95/5 mixture of a clamped normal body
//! and a uniform slow tail, and outcomes are Bernoulli draws at the reported
//! success rate. Everything is driven by one seeded [`StdRng`], so the same
//! metrics and seed always give the same series.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::LoadvizError;
use crate::metrics::LoadTestMetrics;

/// Share of requests drawn from the normal body of the distribution.
const NORMAL_SHARE: f64 = 0.95;
/// Standard deviation of the normal body as a fraction of the mean.
const SPREAD_RATIO: f64 = 0.2;

/// One synthesized request. Column order matches `k6_timeseries_data.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRequestSample {
    pub time_seconds: f64,
    /// Milliseconds.
    pub response_time: f64,
    pub active_users: u64,
    pub status_code: u16,
    /// 1 when `status_code` is 200, else 0.
    pub success: u8,
}

/// Knobs of the generator that are not part of the k6 metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticProfile {
    pub seed: u64,
    /// Length of the linear ramp from 0 to `max_users`.
    pub ramp_up_secs: u64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            seed: 42,
            ramp_up_secs: 30,
        }
    }
}

/// Active users at whole second `second` of a linear ramp.
///
/// `floor(second * max_users / ramp_up_secs)` during the ramp, `max_users`
/// from the end of the ramp on. A zero-length ramp starts at `max_users`.
pub fn active_users_at(second: u64, max_users: u64, ramp_up_secs: u64) -> u64 {
    if ramp_up_secs == 0 || second >= ramp_up_secs {
        return max_users;
    }
    // Widened so huge user counts cannot overflow; the quotient stays below
    // `max_users`.
    (u128::from(second) * u128::from(max_users) / u128::from(ramp_up_secs)) as u64
}

/// Requests emitted in a second with `users` of `max_users` active.
///
/// At least one request per second, except when there are no users at all.
pub fn requests_in_second(request_rate: f64, users: u64, max_users: u64) -> u64 {
    if max_users == 0 {
        return 0;
    }
    let expected = request_rate * users as f64 / max_users as f64;
    (expected.round() as u64).max(1)
}

/// Latency mixture derived from the summary percentiles.
struct LatencyModel {
    body: Normal<f64>,
    min: f64,
    p95: f64,
    max: f64,
}

impl LatencyModel {
    fn new(m: &LoadTestMetrics) -> Result<Self, LoadvizError> {
        if !m.avg_response_time.is_finite() || m.avg_response_time < 0.0 {
            return Err(LoadvizError::InvalidMetric(format!(
                "avg_response_time must be a non-negative number (got {})",
                m.avg_response_time
            )));
        }
        let body = Normal::new(m.avg_response_time, m.avg_response_time * SPREAD_RATIO)
            .map_err(|e| {
                LoadvizError::InvalidMetric(format!(
                    "avg_response_time {} cannot seed a latency distribution: {e}",
                    m.avg_response_time
                ))
            })?;
        Ok(Self {
            body,
            min: m.min_response_time,
            p95: m.p95_response_time,
            max: m.max_response_time,
        })
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        if rng.gen::<f64>() < NORMAL_SHARE {
            // Lower bound applied last so it wins if min > p95.
            self.body.sample(rng).min(self.p95).max(self.min)
        } else if self.max > self.p95 {
            rng.gen_range(self.p95..=self.max)
        } else {
            self.p95
        }
    }
}

/// Expand the aggregate metrics into a per-request series.
///
/// Seconds `0..floor(test_duration)` are walked in order; within a second the
/// requests are spread evenly so `time_seconds` is strictly increasing.
pub fn generate_synthetic_timeseries(
    metrics: &LoadTestMetrics,
    profile: &SyntheticProfile,
) -> Result<Vec<SyntheticRequestSample>, LoadvizError> {
    let model = LatencyModel::new(metrics)?;
    let mut rng = StdRng::seed_from_u64(profile.seed);

    let request_rate = if metrics.test_duration > 0.0 {
        metrics.total_requests as f64 / metrics.test_duration
    } else {
        0.0
    };
    let seconds = metrics.test_duration.floor().max(0.0) as u64;
    let success_probability = metrics.success_rate / 100.0;

    let mut samples = Vec::new();
    for second in 0..seconds {
        let users = active_users_at(second, metrics.max_users, profile.ramp_up_secs);
        let count = requests_in_second(request_rate, users, metrics.max_users);

        for r in 0..count {
            let response_time = model.sample(&mut rng);
            let success = rng.gen::<f64>() < success_probability;
            samples.push(SyntheticRequestSample {
                time_seconds: second as f64 + r as f64 / count as f64,
                response_time,
                active_users: users,
                status_code: if success { 200 } else { 500 },
                success: u8::from(success),
            });
        }
    }

    tracing::info!(
        samples = samples.len(),
        seconds,
        seed = profile.seed,
        "generated synthetic time series"
    );
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::sample_metrics;

    fn generate(metrics: &LoadTestMetrics) -> Vec<SyntheticRequestSample> {
        generate_synthetic_timeseries(metrics, &SyntheticProfile::default())
            .expect("generation should succeed")
    }

    // -----------------------------------------------------------------------
    // active_users_at / requests_in_second
    // -----------------------------------------------------------------------

    #[test]
    fn ramp_starts_at_zero_and_reaches_max_at_window_end() {
        assert_eq!(active_users_at(0, 25, 30), 0);
        assert_eq!(active_users_at(6, 25, 30), 5);
        assert_eq!(active_users_at(29, 25, 30), 24);
        assert_eq!(active_users_at(30, 25, 30), 25);
        assert_eq!(active_users_at(500, 25, 30), 25);
    }

    #[test]
    fn ramp_is_non_decreasing() {
        let users: Vec<u64> = (0..120).map(|s| active_users_at(s, 25, 30)).collect();
        assert!(users.windows(2).all(|w| w[0] <= w[1]));
        assert!(users[30..].iter().all(|&u| u == 25));
    }

    #[test]
    fn zero_length_ramp_starts_at_max() {
        assert_eq!(active_users_at(0, 10, 0), 10);
    }

    #[test]
    fn request_count_has_floor_of_one() {
        assert_eq!(requests_in_second(25.0, 0, 25), 1);
        assert_eq!(requests_in_second(0.1, 25, 25), 1);
    }

    #[test]
    fn request_count_rounds_to_nearest() {
        assert_eq!(requests_in_second(25.0, 25, 25), 25);
        assert_eq!(requests_in_second(10.0, 1, 4), 3); // 2.5 rounds away from zero
        assert_eq!(requests_in_second(10.0, 1, 3), 3); // 3.33
        assert_eq!(requests_in_second(10.0, 2, 3), 7); // 6.67
    }

    #[test]
    fn request_count_without_users_is_zero() {
        assert_eq!(requests_in_second(25.0, 0, 0), 0);
    }

    // -----------------------------------------------------------------------
    // generate_synthetic_timeseries
    // -----------------------------------------------------------------------

    #[test]
    fn same_seed_gives_identical_series() {
        let m = sample_metrics();
        assert_eq!(generate(&m), generate(&m));
    }

    #[test]
    fn different_seed_changes_latencies() {
        let m = sample_metrics();
        let a = generate(&m);
        let b = generate_synthetic_timeseries(
            &m,
            &SyntheticProfile {
                seed: 7,
                ramp_up_secs: 30,
            },
        )
        .unwrap();
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }

    #[test]
    fn response_times_respect_min_and_mixture_shape() {
        let m = sample_metrics();
        let series = generate(&m);
        assert!(series
            .iter()
            .all(|s| s.response_time >= m.min_response_time));
        assert!(series
            .iter()
            .all(|s| s.response_time <= m.max_response_time));

        let in_body = series
            .iter()
            .filter(|s| {
                s.response_time >= m.min_response_time && s.response_time <= m.p95_response_time
            })
            .count();
        assert!(in_body as f64 >= 0.9 * series.len() as f64);
    }

    #[test]
    fn status_and_success_agree() {
        for s in generate(&sample_metrics()) {
            match s.status_code {
                200 => assert_eq!(s.success, 1),
                500 => assert_eq!(s.success, 0),
                other => panic!("unexpected status {other}"),
            }
        }
    }

    #[test]
    fn success_share_tracks_success_rate() {
        let series = generate(&sample_metrics());
        let ok = series.iter().filter(|s| s.success == 1).count();
        let share = ok as f64 / series.len() as f64 * 100.0;
        assert!((96.0..=100.0).contains(&share), "share was {share}");
    }

    #[test]
    fn full_success_rate_never_fails() {
        let mut m = sample_metrics();
        m.success_rate = 100.0;
        assert!(generate(&m).iter().all(|s| s.success == 1));
    }

    #[test]
    fn zero_max_users_emits_nothing() {
        let mut m = sample_metrics();
        m.max_users = 0;
        assert!(generate(&m).is_empty());
    }

    #[test]
    fn zero_duration_emits_nothing() {
        let mut m = sample_metrics();
        m.test_duration = 0.0;
        assert!(generate(&m).is_empty());
    }

    #[test]
    fn fractional_duration_uses_whole_seconds() {
        let mut m = sample_metrics();
        m.test_duration = 10.9;
        let series = generate(&m);
        assert!(!series.is_empty());
        assert!(series.iter().all(|s| s.time_seconds < 10.0));
        assert_eq!(series.last().unwrap().time_seconds.floor(), 9.0);
    }

    #[test]
    fn times_are_strictly_increasing_and_spread_within_second() {
        let series = generate(&sample_metrics());
        assert!(series
            .windows(2)
            .all(|w| w[0].time_seconds < w[1].time_seconds));

        let last_second: Vec<f64> = series
            .iter()
            .filter(|s| s.time_seconds.floor() == 59.0)
            .map(|s| s.time_seconds)
            .collect();
        assert_eq!(last_second.len(), 25);
        assert_eq!(last_second[0], 59.0);
        assert!((last_second[1] - 59.04).abs() < 1e-9);
    }

    #[test]
    fn sixty_second_run_matches_ramp_scenario() {
        let m = sample_metrics();
        let series = generate(&m);

        assert!(series.iter().all(|s| (0.0..60.0).contains(&s.time_seconds)));
        assert_eq!(series.first().unwrap().time_seconds, 0.0);
        assert_eq!(series.first().unwrap().active_users, 0);
        assert!(series
            .iter()
            .filter(|s| s.time_seconds >= 30.0)
            .all(|s| s.active_users == 25));
        assert!(series
            .windows(2)
            .all(|w| w[0].active_users <= w[1].active_users));

        // 1 + sum over s=1..=30 of max(1, floor(5s/6)) = 377, then 29 s at 25.
        assert_eq!(series.len(), 377 + 29 * 25);
    }

    #[test]
    fn request_total_is_within_a_request_per_second_of_ramp_expectation() {
        let m = sample_metrics();
        let profile = SyntheticProfile::default();
        let series = generate(&m);

        let rate = m.total_requests as f64 / m.test_duration;
        let expected: f64 = (0..60)
            .map(|s| {
                rate * active_users_at(s, m.max_users, profile.ramp_up_secs) as f64
                    / m.max_users as f64
            })
            .sum();
        assert!((series.len() as f64 - expected).abs() <= 60.0);
    }

    #[test]
    fn without_ramp_total_matches_total_requests() {
        let m = sample_metrics();
        let series = generate_synthetic_timeseries(
            &m,
            &SyntheticProfile {
                seed: 42,
                ramp_up_secs: 0,
            },
        )
        .unwrap();
        let diff = series.len() as i64 - m.total_requests as i64;
        assert!(diff.abs() <= 60, "diff was {diff}");
    }

    #[test]
    fn degenerate_tail_collapses_to_p95() {
        let mut m = sample_metrics();
        m.max_response_time = m.p95_response_time;
        let series = generate(&m);
        assert!(series
            .iter()
            .all(|s| s.response_time <= m.p95_response_time));
    }

    #[test]
    fn negative_average_is_rejected() {
        let mut m = sample_metrics();
        m.avg_response_time = -10.0;
        let err = generate_synthetic_timeseries(&m, &SyntheticProfile::default()).unwrap_err();
        assert!(matches!(err, LoadvizError::InvalidMetric(_)));
    }

    #[test]
    fn non_finite_average_is_rejected() {
        let mut m = sample_metrics();
        m.avg_response_time = f64::NAN;
        let err = generate_synthetic_timeseries(&m, &SyntheticProfile::default()).unwrap_err();
        assert!(matches!(err, LoadvizError::InvalidMetric(_)));
    }

    #[test]
    fn ramp_with_huge_user_count_stays_monotonic() {
        let max_users = 1_000_000_000_000_000_000;
        let mut prev = 0;
        for s in 0..=30 {
            let users = active_users_at(s, max_users, 30);
            assert!(users >= prev, "second {s}: {users} < {prev}");
            assert!(users <= max_users);
            prev = users;
        }
        assert_eq!(active_users_at(15, max_users, 30), max_users / 2);
        assert_eq!(active_users_at(30, max_users, 30), max_users);
        assert!(active_users_at(29, u64::MAX, 30) < u64::MAX);
    }

    #[test]
    fn huge_user_count_generates_without_overflow() {
        let mut m = sample_metrics();
        m.max_users = 1_000_000_000_000_000_000;
        assert!(crate::metrics::validate_metrics(&m).is_empty());
        let series = generate(&m);
        assert!(series.windows(2).all(|w| w[0].active_users <= w[1].active_users));
        assert_eq!(series.last().unwrap().active_users, m.max_users);
    }
}
