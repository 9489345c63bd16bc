use super::SourceError;
use crate::types::{round2, RawVariant, VariantClass};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Streams per-allele records out of a single-sample VCF.
///
/// Read counts and frequencies come from the `DP`, `RO`, `AO`, `AF` and
/// `TYPE` INFO keys (freebayes style); `AO`, `AF` and `TYPE` are per-ALT.
pub struct VcfReader {
    reader: Box<dyn BufRead>,
    line_no: usize,
    buf: String,
    queued: VecDeque<RawVariant>,
}

impl VcfReader {
    /// Open a VCF, transparently handling gzip/bgzip and the other formats
    /// niffler recognises.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let (reader, _format) = niffler::get_reader(Box::new(file))
            .map_err(|e| SourceError::Decompress(e.to_string()))?;
        Ok(Self::new(BufReader::new(reader)))
    }

    pub fn new<R: BufRead + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            line_no: 0,
            buf: String::new(),
            queued: VecDeque::new(),
        }
    }
}

impl Iterator for VcfReader {
    type Item = Result<RawVariant, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(variant) = self.queued.pop_front() {
                return Some(Ok(variant));
            }

            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(SourceError::Io(e))),
            }
            self.line_no += 1;

            let line = self.buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_record(line, self.line_no) {
                Ok(variants) => self.queued.extend(variants),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn parse_info(field: &str) -> HashMap<&str, &str> {
    field
        .split(';')
        .filter(|entry| !entry.is_empty() && *entry != ".")
        .map(|entry| entry.split_once('=').unwrap_or((entry, "")))
        .collect()
}

fn parse_value<T: FromStr>(raw: &str, key: &str, line: usize) -> Result<T, SourceError> {
    raw.parse::<T>().map_err(|_| SourceError::Parse {
        line,
        message: format!("invalid {} value '{}'", key, raw),
    })
}

fn required<'a>(info: &HashMap<&str, &'a str>, key: &str, line: usize) -> Result<&'a str, SourceError> {
    info.get(key).copied().ok_or_else(|| SourceError::Parse {
        line,
        message: format!("missing INFO key {}", key),
    })
}

fn per_allele<T: FromStr>(info: &HashMap<&str, &str>, key: &str, line: usize) -> Result<Vec<T>, SourceError> {
    required(info, key, line)?
        .split(',')
        .map(|raw| parse_value(raw, key, line))
        .collect()
}

fn is_symbolic(alt: &str) -> bool {
    alt.starts_with('<') || alt == "*" || alt == "."
}

/// Split one data line into a record per concrete ALT allele.
pub(crate) fn parse_record(line: &str, line_no: usize) -> Result<Vec<RawVariant>, SourceError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 8 {
        return Err(SourceError::Parse {
            line: line_no,
            message: format!("expected at least 8 columns, found {}", fields.len()),
        });
    }

    let chromosome = fields[0];
    let position: u64 = parse_value(fields[1], "POS", line_no)?;
    let reference = fields[3];
    let info = parse_info(fields[7]);

    let depth: u32 = parse_value(required(&info, "DP", line_no)?, "DP", line_no)?;
    let reference_reads: u32 = parse_value(required(&info, "RO", line_no)?, "RO", line_no)?;
    let alternate_reads: Vec<u32> = per_allele(&info, "AO", line_no)?;
    let frequencies: Vec<f64> = per_allele(&info, "AF", line_no)?;
    let classes: Vec<&str> = required(&info, "TYPE", line_no)?.split(',').collect();

    let mut variants = Vec::new();
    for (idx, alt) in fields[4].split(',').enumerate() {
        if is_symbolic(alt) {
            continue;
        }

        let missing = |key: &str| SourceError::Parse {
            line: line_no,
            message: format!("{} has no value for ALT allele {}", key, idx + 1),
        };
        let ao = *alternate_reads.get(idx).ok_or_else(|| missing("AO"))?;
        let af = *frequencies.get(idx).ok_or_else(|| missing("AF"))?;
        let class = classes.get(idx).ok_or_else(|| missing("TYPE"))?;
        let variant_class = class.parse::<VariantClass>().map_err(|e| SourceError::Parse {
            line: line_no,
            message: e.to_string(),
        })?;

        variants.push(RawVariant {
            chromosome: chromosome.to_string(),
            position,
            reference: reference.to_string(),
            alternate: alt.to_string(),
            depth,
            reference_reads,
            alternate_reads: ao,
            minor_allele_frequency: round2(af.min(1.0 - af)),
            variant_class,
        });
    }

    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "##fileformat=VCFv4.1\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample\n";

    #[test]
    fn test_single_allele_record() {
        let line = "1\t931393\t.\tG\tT\t2.17938e-13\t.\tAB=0;AF=0.98;AO=95;DP=4124;RO=4029;TYPE=snp\tGT\t0/0";
        let variants = parse_record(line, 3).unwrap();
        assert_eq!(variants.len(), 1);

        let v = &variants[0];
        assert_eq!(v.chromosome, "1");
        assert_eq!(v.position, 931_393);
        assert_eq!(v.reference, "G");
        assert_eq!(v.alternate, "T");
        assert_eq!(v.depth, 4124);
        assert_eq!(v.reference_reads, 4029);
        assert_eq!(v.alternate_reads, 95);
        assert_eq!(v.minor_allele_frequency, 0.02);
        assert_eq!(v.variant_class, VariantClass::Snp);
    }

    #[test]
    fn test_multi_allelic_record_splits() {
        let line = "1\t1654007\t.\tA\tG,T\t.\t.\tAF=0.3,0.25;AO=300,250;DP=1000;RO=450;TYPE=snp,snp";
        let variants = parse_record(line, 1).unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].alternate, "G");
        assert_eq!(variants[0].alternate_reads, 300);
        assert_eq!(variants[0].minor_allele_frequency, 0.3);
        assert_eq!(variants[1].alternate, "T");
        assert_eq!(variants[1].alternate_reads, 250);
        assert_eq!(variants[1].minor_allele_frequency, 0.25);
    }

    #[test]
    fn test_symbolic_alleles_skipped_without_shifting_indices() {
        let line = "2\t500\t.\tC\t<DEL>,CT\t.\t.\tAF=0.1,0.4;AO=1,40;DP=100;RO=59;TYPE=del,ins";
        let variants = parse_record(line, 1).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].alternate, "CT");
        assert_eq!(variants[0].alternate_reads, 40);
        assert_eq!(variants[0].variant_class, VariantClass::Ins);
    }

    #[test]
    fn test_missing_info_key_is_parse_error() {
        let line = "1\t100\t.\tA\tG\t.\t.\tAF=0.5;AO=5;RO=5;TYPE=snp";
        let err = parse_record(line, 12).unwrap_err();
        match err {
            SourceError::Parse { line, message } => {
                assert_eq!(line, 12);
                assert!(message.contains("DP"), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_short_line_is_parse_error() {
        assert!(matches!(
            parse_record("1\t100\t.\tA", 1),
            Err(SourceError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_reader_skips_headers_and_tracks_lines() {
        let text = format!(
            "{}1\t100\t.\tA\tG\t.\t.\tAF=0.5;AO=5;DP=10;RO=5;TYPE=snp\n\n1\t200\t.\tAT\tA\t.\t.\tAF=0.2;AO=2;DP=10;RO=8;TYPE=del\n1\t300\t.\tA\tG\t.\t.\tDP=10\n",
            HEADER
        );
        let items: Vec<_> = VcfReader::new(Cursor::new(text)).collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().position, 100);
        assert_eq!(items[1].as_ref().unwrap().variant_class, VariantClass::Del);
        assert!(matches!(items[2], Err(SourceError::Parse { line: 6, .. })));
    }

    #[test]
    fn test_from_path_plain_and_missing() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("calls.vcf");
        let mut file = File::create(&plain).unwrap();
        write!(file, "{}1\t100\t.\tA\tG\t.\t.\tAF=0.5;AO=5;DP=10;RO=5;TYPE=snp\n", HEADER).unwrap();
        drop(file);

        let variants: Vec<_> = VcfReader::from_path(&plain)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(variants.len(), 1);

        let missing = dir.path().join("absent.vcf");
        assert!(matches!(
            VcfReader::from_path(&missing),
            Err(SourceError::Open { .. })
        ));
    }

    #[test]
    fn test_from_path_gzip_matches_plain() {
        use std::io::Write;

        let body = format!(
            "{}1\t100\t.\tA\tG\t.\t.\tAF=0.5;AO=5;DP=10;RO=5;TYPE=snp\n1\t1654007\t.\tA\tG,T\t.\t.\tAF=0.3,0.25;AO=300,250;DP=1000;RO=450;TYPE=snp,snp\n",
            HEADER
        );
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("calls.vcf");
        std::fs::write(&plain, &body).unwrap();

        let gzipped = dir.path().join("calls.vcf.gz");
        let mut writer = niffler::to_path(&gzipped, niffler::compression::Format::Gzip, niffler::Level::One).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        drop(writer);

        let read = |path: &Path| {
            VcfReader::from_path(path)
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
        };
        let expected = read(&plain);
        assert_eq!(expected.len(), 3);
        assert_ne!(std::fs::read(&gzipped).unwrap(), body.as_bytes());
        assert_eq!(read(&gzipped), expected);
    }
}
