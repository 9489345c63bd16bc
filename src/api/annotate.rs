use super::{ApiResult, ProgressCallback, ProgressEvent};
use crate::client::{RetryPolicy, RetryingAnnotationClient};
use crate::config::Config;
use crate::export::{CsvSink, RecordSink};
use crate::pipeline::{BatchPipeline, RunSummary, VepBatchAnnotator};
use crate::readers::{validated, InvalidRecordPolicy, VcfReader};
use crate::vendor::{AnnotationService, EnsemblVep};
use serde::Serialize;
use std::path::PathBuf;

const TASK: &str = "annotate";

#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    pub vcf: PathBuf,
    pub output: PathBuf,
    pub config: Config,
    pub invalid_records: InvalidRecordPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnnotateReport {
    pub summary: RunSummary,
    /// Source records dropped under [`InvalidRecordPolicy::Skip`].
    pub skipped: usize,
}

/// Annotate every variant in `options.vcf` against the configured Ensembl
/// VEP endpoint and write one CSV row per variant.
pub fn annotate_vcf(options: &AnnotateOptions, progress: Option<ProgressCallback>) -> ApiResult<AnnotateReport> {
    let service = EnsemblVep::new(&options.config.service)?;
    let policy = RetryPolicy::from_config(&options.config.retry);
    annotate_with_service(options, service, policy, progress)
}

/// Same as [`annotate_vcf`] with a caller-supplied lookup service.
pub fn annotate_with_service<S: AnnotationService + 'static>(
    options: &AnnotateOptions,
    service: S,
    policy: RetryPolicy,
    progress: Option<ProgressCallback>,
) -> ApiResult<AnnotateReport> {
    let notify = |event: ProgressEvent| {
        if let Some(cb) = &progress {
            cb(event);
        }
    };
    notify(ProgressEvent::Started {
        task: TASK.to_string(),
    });

    let result = run(options, service, policy, &notify);
    match &result {
        Ok(report) => {
            if report.skipped > 0 {
                notify(ProgressEvent::Message {
                    task: TASK.to_string(),
                    message: format!("Skipped {} invalid records", report.skipped),
                });
            }
            notify(ProgressEvent::Completed {
                task: TASK.to_string(),
            });
        }
        Err(e) => notify(ProgressEvent::Error {
            task: TASK.to_string(),
            error: e.to_string(),
        }),
    }
    result
}

fn run<S: AnnotationService + 'static>(
    options: &AnnotateOptions,
    service: S,
    policy: RetryPolicy,
    notify: &dyn Fn(ProgressEvent),
) -> ApiResult<AnnotateReport> {
    let config = &options.config;
    let annotator = VepBatchAnnotator::new(
        RetryingAnnotationClient::new(service, policy),
        config.service.query_template.clone(),
    );
    let pipeline = BatchPipeline::new(annotator, config.pipeline.batch_size, config.pipeline.threads)?;

    let source = VcfReader::from_path(&options.vcf)?;
    let mut sink = CsvSink::create(&options.output)?;
    let mut skipped = 0;

    let summary = pipeline.run_with_progress(
        validated(source, options.invalid_records, &mut skipped),
        |record| sink.write(&record),
        |p| {
            notify(ProgressEvent::Progress {
                task: TASK.to_string(),
                batches: p.batch + 1,
                variants: p.emitted,
            })
        },
    )?;
    sink.finish()?;

    Ok(AnnotateReport { summary, skipped })
}
