pub mod providers;
pub mod report;
