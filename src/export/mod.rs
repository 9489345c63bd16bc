mod csv_sink;

pub use csv_sink::CsvSink;

use crate::error::Result;
use crate::types::AnnotatedVariant;

/// Column names, in output order.
pub const COLUMNS: [&str; 12] = [
    "chromosome",
    "position",
    "reference",
    "alternate",
    "depth",
    "reference_reads",
    "alternate_reads",
    "minor_allele_frequency",
    "variant_class",
    "alt_percent",
    "gene",
    "consequence",
];

/// Destination for annotated records, written in the order received.
pub trait RecordSink {
    fn write(&mut self, record: &AnnotatedVariant) -> Result<()>;

    /// Flush buffered output. Called once after the last record.
    fn finish(&mut self) -> Result<()>;
}

impl RecordSink for Vec<AnnotatedVariant> {
    fn write(&mut self, record: &AnnotatedVariant) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Render a record as output cells, matching [`COLUMNS`].
pub fn row(record: &AnnotatedVariant) -> [String; 12] {
    let v = record.variant();
    [
        v.chromosome().to_string(),
        v.position().to_string(),
        v.reference().to_string(),
        v.alternate().to_string(),
        v.depth().to_string(),
        v.reference_reads().to_string(),
        v.alternate_reads().to_string(),
        v.minor_allele_frequency().to_string(),
        v.variant_class().to_string(),
        record.alt_percent().to_string(),
        record.gene().unwrap_or_default().to_string(),
        record.consequence().unwrap_or_default().to_string(),
    ]
}
