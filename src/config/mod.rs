mod config;

pub use config::{Config, PipelineConfig, RetryConfig, ServiceConfig, MAX_THREADS};
