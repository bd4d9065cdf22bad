use std::path::Path;

use serde::Serialize;

use crate::baseline::BaselineSample;
use crate::error::LoadvizError;
use crate::synthetic::SyntheticRequestSample;

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Write the baseline samples as `response_time,status_code,success`.
pub fn write_baseline_csv(
    path: impl AsRef<Path>,
    samples: &[BaselineSample],
) -> Result<(), LoadvizError> {
    write_records(path.as_ref(), samples)
}

/// Write the synthetic series as
/// `time_seconds,response_time,active_users,status_code,success`.
pub fn write_timeseries_csv(
    path: impl AsRef<Path>,
    samples: &[SyntheticRequestSample],
) -> Result<(), LoadvizError> {
    write_records(path.as_ref(), samples)
}

/// Serialize `records` to an in-memory CSV document with a header row.
pub fn to_csv_string<T: Serialize>(records: &[T]) -> Result<String, LoadvizError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| LoadvizError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))?;
    String::from_utf8(bytes).map_err(|e| LoadvizError::Parse(e.to_string()))
}

// The whole file is replaced in one write.
fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), LoadvizError> {
    let content = to_csv_string(records)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), rows = records.len(), "wrote CSV");
    Ok(())
}
