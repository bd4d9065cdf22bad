pub mod baseline;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod summary;
pub mod synthetic;

pub use error::LoadvizError;
