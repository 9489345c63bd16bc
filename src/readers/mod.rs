mod vcf;

pub use vcf::VcfReader;

use crate::error::AnnotateError;
use crate::types::{RawVariant, Variant};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decompress input: {0}")]
    Decompress(String),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do with a source record that is malformed or fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidRecordPolicy {
    /// Stop the run on the first bad record.
    #[default]
    Abort,
    /// Log the record and carry on.
    Skip,
}

/// Turn raw source records into validated variants under `policy`.
///
/// I/O failures always abort. `skipped` counts records dropped under
/// [`InvalidRecordPolicy::Skip`].
pub fn validated<'a, I>(
    records: I,
    policy: InvalidRecordPolicy,
    skipped: &'a mut usize,
) -> impl Iterator<Item = Result<Variant, AnnotateError>> + 'a
where
    I: IntoIterator<Item = Result<RawVariant, SourceError>> + 'a,
    I::IntoIter: 'a,
{
    records.into_iter().filter_map(move |record| {
        let result = match record {
            Ok(raw) => Variant::try_from(raw).map_err(AnnotateError::from),
            Err(err @ SourceError::Parse { .. }) => Err(AnnotateError::Source(err)),
            Err(other) => return Some(Err(AnnotateError::Source(other))),
        };

        match (result, policy) {
            (Ok(variant), _) => Some(Ok(variant)),
            (Err(err), InvalidRecordPolicy::Abort) => Some(Err(err)),
            (Err(err), InvalidRecordPolicy::Skip) => {
                warn!(error = %err, "skipping invalid record");
                *skipped += 1;
                None
            }
        }
    })
}
