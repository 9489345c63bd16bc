use super::{row, RecordSink, COLUMNS};
use crate::error::Result;
use crate::types::AnnotatedVariant;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Comma-separated output with a single header row.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap `inner` and write the header immediately, so an empty run still
    /// produces a valid file.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(COLUMNS)?;
        Ok(Self { writer, written: 0 })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::AnnotateError::Sink(e.to_string()))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write(&mut self, record: &AnnotatedVariant) -> Result<()> {
        self.writer.write_record(row(record))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawVariant, Variant, VariantClass};

    fn annotated(gene: Option<&str>) -> AnnotatedVariant {
        let variant = Variant::try_from(RawVariant {
            chromosome: "1".to_string(),
            position: 1_654_007,
            reference: "A".to_string(),
            alternate: "G".to_string(),
            depth: 1000,
            reference_reads: 450,
            alternate_reads: 300,
            minor_allele_frequency: 0.3,
            variant_class: VariantClass::Snp,
        })
        .unwrap();
        AnnotatedVariant::new(
            variant,
            gene.map(str::to_string),
            gene.map(|_| "missense_variant".to_string()),
        )
    }

    #[test]
    fn test_header_written_once() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.write(&annotated(Some("CDK11A"))).unwrap();
        sink.write(&annotated(None)).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.written(), 2);

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "chromosome,position,reference,alternate,depth,reference_reads,alternate_reads,minor_allele_frequency,variant_class,alt_percent,gene,consequence"
        );
        assert_eq!(lines[1], "1,1654007,A,G,1000,450,300,0.3,snp,40,CDK11A,missense_variant");
        assert_eq!(lines[2], "1,1654007,A,G,1000,450,300,0.3,snp,40,,");
    }

    #[test]
    fn test_empty_run_still_has_header() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.finish().unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
