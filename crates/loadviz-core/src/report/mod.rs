pub mod panels;
pub mod render;

pub use panels::{ReportData, UserBucket};
pub use render::render_report;
