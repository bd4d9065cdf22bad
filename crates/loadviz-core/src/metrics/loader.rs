use std::path::Path;

use serde::Deserialize;

use crate::error::LoadvizError;
use crate::metrics::{validate_metrics, LoadTestMetrics, MetricMap, MetricValue};

const REQUIRED_COLUMNS: [&str; 3] = ["metric", "value", "unit"];

#[derive(Debug, Deserialize)]
struct MetricRow {
    metric: String,
    value: f64,
    unit: String,
}

/// Read a k6 summary file (`metric,value,unit`) and return the typed,
/// validated metrics.
pub async fn load_metrics(path: impl AsRef<Path>) -> Result<LoadTestMetrics, LoadvizError> {
    let map = read_metric_map(path).await?;
    let metrics = LoadTestMetrics::from_map(&map)?;
    if let Some(err) = validate_metrics(&metrics).into_iter().next() {
        return Err(err);
    }
    Ok(metrics)
}

/// Read a k6 summary file into a raw name → value map.
pub async fn read_metric_map(path: impl AsRef<Path>) -> Result<MetricMap, LoadvizError> {
    let path = path.as_ref();
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadvizError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let map = parse_metric_map(&content)?;
    tracing::info!(path = %path.display(), metrics = map.len(), "loaded k6 metrics");
    Ok(map)
}

/// Parse CSV content with a `metric,value,unit` header.
///
/// Later rows win when a metric name repeats.
pub fn parse_metric_map(content: &str) -> Result<MetricMap, LoadvizError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LoadvizError::Parse(format!("Failed to read CSV headers: {e}")))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadvizError::Parse(format!(
                "CSV is missing the '{column}' column"
            )));
        }
    }

    let mut map = MetricMap::new();
    for (idx, result) in reader.deserialize::<MetricRow>().enumerate() {
        // +2: one for the header, one for 1-based numbering.
        let row = result.map_err(|e| LoadvizError::Parse(format!("row {}: {e}", idx + 2)))?;
        if row.metric.is_empty() {
            return Err(LoadvizError::Parse(format!(
                "row {}: metric name is empty",
                idx + 2
            )));
        }
        map.insert(
            row.metric,
            MetricValue {
                value: row.value,
                unit: row.unit,
            },
        );
    }
    Ok(map)
}
