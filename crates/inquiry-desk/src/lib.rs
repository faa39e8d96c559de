pub mod config;
pub mod error;
pub mod inquiries;
pub mod telemetry;
