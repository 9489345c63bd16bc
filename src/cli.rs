use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log filter, e.g. "info" or "variant_annotator=debug"
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate every variant in a VCF with VEP consequences and write a CSV
    Annotate {
        /// Path to the input VCF file (plain or compressed)
        #[arg(long, default_value = "challenge_data.vcf")]
        vcf: PathBuf,

        /// Output CSV file with annotated variants
        #[arg(short = 'o', long, default_value = "annotated_variants.csv")]
        output: PathBuf,

        /// Number of batches processed in parallel (max 32)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=32))]
        threads: Option<u8>,

        /// Number of variants sent to the service per request
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        batch_size: Option<u64>,

        /// Override the annotation service endpoint
        #[arg(long)]
        service_url: Option<String>,

        /// Config file to use instead of the per-user one
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log and skip invalid records instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Print the genomic (g.) notation for a single allele pair
    Hgvs {
        /// Chromosome name, e.g. 1 or chrX
        chrom: String,
        /// 1-based position of the first reference base
        pos: u64,
        /// Reference allele
        #[arg(name = "REF")]
        reference: String,
        /// Alternate allele
        #[arg(name = "ALT")]
        alternate: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_threads_bounded() {
        assert!(Args::try_parse_from(["variant-annotator", "annotate", "--threads", "33"]).is_err());
        assert!(Args::try_parse_from(["variant-annotator", "annotate", "--threads", "0"]).is_err());

        let args = Args::try_parse_from(["variant-annotator", "annotate", "--threads", "32"]).unwrap();
        match args.command {
            Commands::Annotate { threads, vcf, .. } => {
                assert_eq!(threads, Some(32));
                assert_eq!(vcf, PathBuf::from("challenge_data.vcf"));
            }
            _ => panic!("expected annotate"),
        }
    }

    #[test]
    fn test_hgvs_positional_args() {
        let args = Args::try_parse_from(["variant-annotator", "hgvs", "1", "100", "A", "ATG"]).unwrap();
        match args.command {
            Commands::Hgvs { chrom, pos, reference, alternate } => {
                assert_eq!((chrom.as_str(), pos), ("1", 100));
                assert_eq!((reference.as_str(), alternate.as_str()), ("A", "ATG"));
            }
            _ => panic!("expected hgvs"),
        }
    }
}
