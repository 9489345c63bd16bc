pub mod api;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod hgvs;
pub mod pipeline;
pub mod readers;
pub mod types;
pub(crate) mod utils;
pub mod vendor;

// Re-export main API
pub use api::*;
pub use error::{AnnotateError, Result};
