pub mod annotate;

pub use annotate::{annotate_vcf, annotate_with_service, AnnotateOptions, AnnotateReport};

use crate::error::AnnotateError;
use crate::readers::SourceError;
use crate::vendor::ServiceError;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Progress callback for CLI/GUI updates
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress events emitted while a run is underway
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Started { task: String },
    Progress { task: String, batches: usize, variants: usize },
    Message { task: String, message: String },
    Completed { task: String },
    Error { task: String, error: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// API-level errors
#[derive(Debug, Error, Serialize)]
pub enum ApiError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Annotation service error: {0}")]
    Service(String),

    #[error("Annotation failed: {message}")]
    Annotation { batch: Option<usize>, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<AnnotateError> for ApiError {
    fn from(err: AnnotateError) -> Self {
        match err {
            AnnotateError::Io(e) => ApiError::Io(e.to_string()),
            AnnotateError::Validation(e) => ApiError::InvalidInput(e.to_string()),
            AnnotateError::Source(e) => e.into(),
            AnnotateError::InvalidConfig(msg) => ApiError::Config(msg),
            other => ApiError::Annotation {
                batch: other.batch(),
                message: other.to_string(),
            },
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Open { .. } | SourceError::Io(_) => ApiError::Io(err.to_string()),
            _ => ApiError::InvalidInput(err.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Config(err.to_string())
    }
}
