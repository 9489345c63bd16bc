//! Ordered, concurrent batch annotation.
//!
//! Variants are grouped into batches of `batch_size` and handed to a pool of
//! `worker_count` threads. Handles to the pending results are kept in a FIFO
//! in submission order; once `worker_count` of them are outstanding the
//! orchestrating thread drains them front to back and emits every record
//! before submitting more. Output order therefore always equals input
//! order, no matter which batch finishes first.

mod batch;
mod threading;

pub use batch::{format_query, merge, Batch, BatchProcessor, VepBatchAnnotator};
pub use threading::{PendingBatch, WorkerPool};

use crate::config::MAX_THREADS;
use crate::error::{AnnotateError, Result};
use crate::types::{AnnotatedVariant, Variant};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub variants: usize,
    pub batches: usize,
    /// Highest number of batches that were outstanding at once.
    pub max_in_flight: usize,
}

/// Reported after each batch has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainProgress {
    pub batch: usize,
    pub emitted: usize,
}

pub struct BatchPipeline<P: ?Sized> {
    processor: Arc<P>,
    batch_size: usize,
    worker_count: usize,
}

impl<P: BatchProcessor + 'static> BatchPipeline<P> {
    pub fn new(processor: P, batch_size: usize, worker_count: usize) -> Result<Self> {
        Self::with_shared(Arc::new(processor), batch_size, worker_count)
    }
}

impl<P: BatchProcessor + ?Sized + 'static> BatchPipeline<P> {
    pub fn with_shared(processor: Arc<P>, batch_size: usize, worker_count: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(AnnotateError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_THREADS).contains(&worker_count) {
            return Err(AnnotateError::InvalidConfig(format!(
                "worker count must be between 1 and {}, got {}",
                MAX_THREADS, worker_count
            )));
        }

        Ok(Self {
            processor,
            batch_size,
            worker_count,
        })
    }

    /// Annotate `variants`, calling `emit` once per record in input order.
    ///
    /// The first error (from the input, a batch, or `emit`) aborts the run.
    /// Batches are all-or-nothing: a failed batch emits no records.
    pub fn run<I, F>(&self, variants: I, emit: F) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<Variant>>,
        F: FnMut(AnnotatedVariant) -> Result<()>,
    {
        self.run_with_progress(variants, emit, |_| {})
    }

    pub fn run_with_progress<I, F, G>(&self, variants: I, mut emit: F, mut progress: G) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<Variant>>,
        F: FnMut(AnnotatedVariant) -> Result<()>,
        G: FnMut(DrainProgress),
    {
        info!(
            batch_size = self.batch_size,
            workers = self.worker_count,
            "starting annotation run"
        );

        let pool = WorkerPool::new(Arc::clone(&self.processor), self.worker_count)?;
        let mut in_flight: VecDeque<PendingBatch> = VecDeque::with_capacity(self.worker_count);
        let mut summary = RunSummary::default();
        let mut pending = self.new_batch_buffer();

        for variant in variants {
            pending.push(variant?);

            if pending.len() == self.batch_size {
                let full = std::mem::replace(&mut pending, self.new_batch_buffer());
                self.submit(&pool, &mut in_flight, &mut summary, full)?;

                if in_flight.len() == self.worker_count {
                    drain(&mut in_flight, &mut summary, &mut emit, &mut progress)?;
                }
            }
        }

        if !pending.is_empty() {
            self.submit(&pool, &mut in_flight, &mut summary, pending)?;
        }
        // Earlier batches may still be outstanding even if nothing was
        // submitted just now.
        drain(&mut in_flight, &mut summary, &mut emit, &mut progress)?;
        pool.finish();

        info!(
            variants = summary.variants,
            batches = summary.batches,
            "annotation run complete"
        );
        Ok(summary)
    }

    fn new_batch_buffer(&self) -> Vec<Variant> {
        Vec::with_capacity(self.batch_size.min(4096))
    }

    fn submit(
        &self,
        pool: &WorkerPool,
        in_flight: &mut VecDeque<PendingBatch>,
        summary: &mut RunSummary,
        variants: Vec<Variant>,
    ) -> Result<()> {
        let batch = Batch {
            index: summary.batches,
            variants,
        };
        debug!(batch = batch.index, size = batch.len(), "submitting batch");

        in_flight.push_back(pool.submit(batch)?);
        summary.batches += 1;
        summary.max_in_flight = summary.max_in_flight.max(in_flight.len());
        Ok(())
    }
}

/// Wait on every outstanding batch in submission order and emit its records.
fn drain<F, G>(
    in_flight: &mut VecDeque<PendingBatch>,
    summary: &mut RunSummary,
    emit: &mut F,
    progress: &mut G,
) -> Result<()>
where
    F: FnMut(AnnotatedVariant) -> Result<()>,
    G: FnMut(DrainProgress),
{
    while let Some(pending) = in_flight.pop_front() {
        let index = pending.index();
        let expected = pending.len();
        let records = pending.wait()?;

        if records.len() != expected {
            return Err(AnnotateError::MalformedResponse {
                batch: index,
                reason: format!("expected {} records, got {}", expected, records.len()),
            });
        }

        for record in records {
            emit(record)?;
            summary.variants += 1;
        }
        debug!(batch = index, emitted = summary.variants, "drained batch");
        progress(DrainProgress {
            batch: index,
            emitted: summary.variants,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawVariant, VariantClass};

    struct Echo;

    impl BatchProcessor for Echo {
        fn process(&self, batch: &Batch) -> Result<Vec<AnnotatedVariant>> {
            Ok(batch
                .variants
                .iter()
                .cloned()
                .map(|v| AnnotatedVariant::new(v, Some(format!("B{}", batch.index)), None))
                .collect())
        }
    }

    fn variants(n: u64) -> Vec<Result<Variant>> {
        (1..=n)
            .map(|pos| {
                Ok(Variant::try_from(RawVariant {
                    chromosome: "1".to_string(),
                    position: pos,
                    reference: "A".to_string(),
                    alternate: "T".to_string(),
                    depth: 10,
                    reference_reads: 6,
                    alternate_reads: 4,
                    minor_allele_frequency: 0.4,
                    variant_class: VariantClass::Snp,
                })
                .unwrap())
            })
            .collect()
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(matches!(
            BatchPipeline::new(Echo, 0, 4),
            Err(AnnotateError::InvalidConfig(_))
        ));
        assert!(matches!(
            BatchPipeline::new(Echo, 10, 0),
            Err(AnnotateError::InvalidConfig(_))
        ));
        assert!(matches!(
            BatchPipeline::new(Echo, 10, MAX_THREADS + 1),
            Err(AnnotateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_final_batch_and_summary() {
        let pipeline = BatchPipeline::new(Echo, 3, 2).unwrap();
        let mut out = Vec::new();
        let summary = pipeline
            .run(variants(10), |r| {
                out.push((r.variant().position(), r.gene().unwrap().to_string()));
                Ok(())
            })
            .unwrap();

        assert_eq!(summary.variants, 10);
        assert_eq!(summary.batches, 4);
        assert!(summary.max_in_flight <= 2);
        let positions: Vec<u64> = out.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, (1..=10).collect::<Vec<_>>());
        assert_eq!(out[9].1, "B3");
    }

    #[test]
    fn test_empty_input() {
        let pipeline = BatchPipeline::new(Echo, 3, 2).unwrap();
        let summary = pipeline.run(Vec::<Result<Variant>>::new(), |_| Ok(())).unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn test_progress_reported_per_batch() {
        let pipeline = BatchPipeline::new(Echo, 4, 3).unwrap();
        let mut seen = Vec::new();
        pipeline
            .run_with_progress(variants(9), |_| Ok(()), |p| seen.push(p))
            .unwrap();

        assert_eq!(
            seen,
            vec![
                DrainProgress { batch: 0, emitted: 4 },
                DrainProgress { batch: 1, emitted: 8 },
                DrainProgress { batch: 2, emitted: 9 },
            ]
        );
    }

    #[test]
    fn test_input_error_aborts() {
        let pipeline = BatchPipeline::new(Echo, 2, 2).unwrap();
        let mut input = variants(3);
        input.push(Err(AnnotateError::InvalidConfig("bad record".to_string())));
        input.extend(variants(2));

        let mut emitted = 0;
        let err = pipeline
            .run(input, |_| {
                emitted += 1;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidConfig(_)));
        // The error arrives before the first drain point
        assert_eq!(emitted, 0);
    }

    #[test]
    fn test_emit_error_aborts() {
        let pipeline = BatchPipeline::new(Echo, 1, 1).unwrap();
        let err = pipeline
            .run(variants(3), |r| {
                if r.variant().position() == 2 {
                    Err(AnnotateError::Sink("disk full".to_string()))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, AnnotateError::Sink(_)));
    }
}
