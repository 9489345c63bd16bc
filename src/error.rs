use crate::readers::SourceError;
use crate::types::ValidationError;
use crate::vendor::ServiceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnnotateError>;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("invalid variant: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("annotation service error: {0}")]
    Service(#[from] ServiceError),

    #[error("annotation service failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ServiceError,
    },

    #[error("malformed response for batch {batch}: {reason}")]
    MalformedResponse { batch: usize, reason: String },

    #[error("batch {batch} failed: {source}")]
    BatchFailed {
        batch: usize,
        #[source]
        source: Box<AnnotateError>,
    },

    #[error("worker for batch {batch} exited without a result")]
    WorkerLost { batch: usize },

    #[error("failed to write record: {0}")]
    Sink(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnnotateError {
    /// Index of the batch this error belongs to, if any.
    pub fn batch(&self) -> Option<usize> {
        match self {
            AnnotateError::MalformedResponse { batch, .. }
            | AnnotateError::BatchFailed { batch, .. }
            | AnnotateError::WorkerLost { batch } => Some(*batch),
            _ => None,
        }
    }
}

impl From<csv::Error> for AnnotateError {
    fn from(err: csv::Error) -> Self {
        AnnotateError::Sink(err.to_string())
    }
}
