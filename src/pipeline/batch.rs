use crate::client::RetryingAnnotationClient;
use crate::error::{AnnotateError, Result};
use crate::types::{AnnotatedVariant, Variant};
use crate::vendor::{AnnotationService, BatchRequest, VepRecord};
use tracing::debug;

/// A group of variants submitted to the lookup service in one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// 0-based submission number within a run.
    pub index: usize,
    pub variants: Vec<Variant>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// One unit of work for the worker pool. Output must be index-aligned with
/// `batch.variants`.
pub trait BatchProcessor: Send + Sync {
    fn process(&self, batch: &Batch) -> Result<Vec<AnnotatedVariant>>;
}

/// Render a variant into a region query string.
pub fn format_query(template: &str, variant: &Variant) -> String {
    template
        .replace("{chrom}", variant.chromosome())
        .replace("{pos}", &variant.position().to_string())
        .replace("{ref}", variant.reference())
        .replace("{alt}", variant.alternate())
}

/// Merge one lookup record onto its originating variant.
pub fn merge(variant: Variant, record: &VepRecord) -> AnnotatedVariant {
    match record.most_severe_gene() {
        Some(transcript) => AnnotatedVariant::new(
            variant,
            transcript.gene_symbol.clone(),
            Some(record.most_severe_consequence.clone()),
        ),
        None => AnnotatedVariant::new(variant, None, None),
    }
}

/// Annotates a batch through the consequence lookup service.
pub struct VepBatchAnnotator<S> {
    client: RetryingAnnotationClient<S>,
    query_template: String,
}

impl<S: AnnotationService> VepBatchAnnotator<S> {
    pub fn new(client: RetryingAnnotationClient<S>, query_template: impl Into<String>) -> Self {
        Self {
            client,
            query_template: query_template.into(),
        }
    }

    fn build_request(&self, batch: &Batch) -> BatchRequest {
        BatchRequest {
            variants: batch
                .variants
                .iter()
                .map(|v| format_query(&self.query_template, v))
                .collect(),
        }
    }

    fn check_alignment(batch: &Batch, request: &BatchRequest, records: &[VepRecord]) -> Result<()> {
        if records.len() != request.variants.len() {
            return Err(AnnotateError::MalformedResponse {
                batch: batch.index,
                reason: format!(
                    "expected {} records, got {}",
                    request.variants.len(),
                    records.len()
                ),
            });
        }

        for (idx, (query, record)) in request.variants.iter().zip(records).enumerate() {
            if let Some(input) = &record.input {
                if input != query {
                    return Err(AnnotateError::MalformedResponse {
                        batch: batch.index,
                        reason: format!("record {} echoes '{}' but query was '{}'", idx, input, query),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<S: AnnotationService> BatchProcessor for VepBatchAnnotator<S> {
    fn process(&self, batch: &Batch) -> Result<Vec<AnnotatedVariant>> {
        let request = self.build_request(batch);
        debug!(batch = batch.index, variants = batch.len(), "querying annotation service");

        let records = self
            .client
            .call(&request)
            .map_err(|source| AnnotateError::BatchFailed {
                batch: batch.index,
                source: Box::new(source),
            })?;
        Self::check_alignment(batch, &request, &records)?;

        Ok(batch
            .variants
            .iter()
            .cloned()
            .zip(&records)
            .map(|(variant, record)| merge(variant, record))
            .collect())
    }
}
