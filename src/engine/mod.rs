pub mod analytics;
pub mod scoring;
