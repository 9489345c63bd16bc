use crate::api::{self, AnnotateOptions, ProgressCallback, ProgressEvent};
use crate::config::Config;
use crate::readers::InvalidRecordPolicy;
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Command-line overrides layered on top of the loaded config.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub threads: Option<usize>,
    pub batch_size: Option<usize>,
    pub service_url: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(threads) = self.threads {
            config.pipeline.threads = threads;
        }
        if let Some(batch_size) = self.batch_size {
            config.pipeline.batch_size = batch_size;
        }
        if let Some(url) = self.service_url {
            config.service.url = url;
        }
    }
}

pub fn run(
    vcf: PathBuf,
    output: PathBuf,
    config_path: Option<PathBuf>,
    overrides: Overrides,
    skip_invalid: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load()?,
    };
    overrides.apply(&mut config);

    let options = AnnotateOptions {
        vcf,
        output,
        config,
        invalid_records: if skip_invalid {
            InvalidRecordPolicy::Skip
        } else {
            InvalidRecordPolicy::Abort
        },
    };

    info!(
        vcf = %options.vcf.display(),
        threads = options.config.pipeline.threads,
        batch_size = options.config.pipeline.batch_size,
        "Annotating variants"
    );

    let progress = ProgressBarBuilder::new("Annotating variants")
        .with_tick(Duration::from_millis(120))
        .hidden(!std::io::stderr().is_terminal())
        .build()?;

    let callback: ProgressCallback = {
        let progress = progress.clone();
        Arc::new(move |event: ProgressEvent| match event {
            ProgressEvent::Progress {
                batches, variants, ..
            } => progress.set_message(format!("{} variants annotated ({} batches)", variants, batches)),
            ProgressEvent::Message { message, .. } => warn!("{}", message),
            _ => {}
        })
    };

    let report = api::annotate_vcf(&options, Some(callback)).with_context(|| {
        format!("Annotation of {} failed", options.vcf.display())
    });
    progress.finish_and_clear();
    let report = report?;

    println!("\nAnnotation Summary:");
    println!("Variants written: {}", report.summary.variants);
    println!("Batches: {}", report.summary.batches);
    if report.skipped > 0 {
        println!("Invalid records skipped: {}", report.skipped);
    }
    println!("Output: {}", options.output.display());

    Ok(())
}
