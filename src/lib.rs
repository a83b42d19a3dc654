pub mod audit;
pub mod citations;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
