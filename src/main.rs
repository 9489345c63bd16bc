use clap::Parser;
use tracing_subscriber::EnvFilter;
use variant_annotator::cli::{Args, Commands};
use variant_annotator::commands;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let result = match args.command {
        Commands::Annotate {
            vcf,
            output,
            threads,
            batch_size,
            service_url,
            config,
            skip_invalid,
        } => commands::annotate::run(
            vcf,
            output,
            config,
            commands::annotate::Overrides {
                threads: threads.map(usize::from),
                batch_size: batch_size.map(|n| n as usize),
                service_url,
            },
            skip_invalid,
        ),
        Commands::Hgvs {
            chrom,
            pos,
            reference,
            alternate,
        } => commands::hgvs::run(chrom, pos, reference, alternate),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
