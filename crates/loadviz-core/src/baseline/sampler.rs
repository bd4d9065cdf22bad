use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::sleep;

use crate::baseline::{BaselineRun, BaselineSample};
use crate::http::HttpClient;

/// Probe `url` exactly `probes` times, one request at a time, starting a new
/// probe roughly every `interval`.
///
/// After each probe the sampler sleeps for whatever is left of the interval,
/// so a slow probe is not followed by a full extra interval. Transport
/// failures become [`BaselineSample::failed`] entries; the loop never stops
/// early.
pub async fn run_baseline(
    client: &HttpClient,
    url: &str,
    probes: u32,
    interval: Duration,
) -> BaselineRun {
    tracing::info!(url, probes, "running single user baseline");

    let started_at = Utc::now();
    let mut samples = Vec::with_capacity(probes as usize);

    for i in 0..probes {
        let start = Instant::now();
        let sample = match client.get(url).await {
            Ok(resp) => {
                tracing::debug!(
                    probe = i + 1,
                    status = resp.status,
                    elapsed_ms = resp.elapsed_ms,
                    "baseline probe completed"
                );
                BaselineSample::from_response(&resp)
            }
            Err(e) => {
                tracing::warn!(probe = i + 1, error = %e, "baseline probe failed");
                BaselineSample::failed()
            }
        };
        samples.push(sample);

        if let Some(remaining) = interval.checked_sub(start.elapsed()) {
            sleep(remaining).await;
        }
    }

    let run = BaselineRun {
        url: url.to_string(),
        started_at,
        finished_at: Utc::now(),
        samples,
    };
    tracing::info!(
        probes = run.samples.len(),
        failed = run.failed_probes(),
        "single user baseline completed"
    );
    run
}
