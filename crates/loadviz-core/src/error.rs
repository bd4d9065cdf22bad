use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadvizError {
    #[error("Metrics file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing metric: {0}")]
    MissingMetric(String),

    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Render error: {0}")]
    Render(String),
}

impl LoadvizError {
    /// `true` for problems with the metrics input. The pipeline reports these
    /// and stops before producing any output.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LoadvizError::NotFound(_)
                | LoadvizError::Parse(_)
                | LoadvizError::MissingMetric(_)
                | LoadvizError::InvalidMetric(_)
        )
    }
}
