pub mod export;
pub mod stats;

pub use export::{to_csv_string, write_baseline_csv, write_timeseries_csv};
