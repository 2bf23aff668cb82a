pub mod analysis;
pub mod app;
pub mod report;

pub use analysis::analyze_image;
pub use app::{health_check, index, readiness_check};
pub use report::download_report;
