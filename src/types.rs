use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Variant type as reported by the caller's `TYPE` INFO tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantClass {
    Snp,
    Ins,
    Del,
    Complex,
    Mnp,
}

impl VariantClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantClass::Snp => "snp",
            VariantClass::Ins => "ins",
            VariantClass::Del => "del",
            VariantClass::Complex => "complex",
            VariantClass::Mnp => "mnp",
        }
    }
}

impl fmt::Display for VariantClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snp" => Ok(VariantClass::Snp),
            "ins" => Ok(VariantClass::Ins),
            "del" => Ok(VariantClass::Del),
            "complex" => Ok(VariantClass::Complex),
            "mnp" => Ok(VariantClass::Mnp),
            _ => Err(ValidationError::UnknownVariantClass(s.to_string())),
        }
    }
}

/// Which allele field an allele-level validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleField {
    Reference,
    Alternate,
}

impl fmt::Display for AlleleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlleleField::Reference => f.write_str("reference"),
            AlleleField::Alternate => f.write_str("alternate"),
        }
    }
}

/// The invariant a raw record violated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("position must be positive")]
    NonPositivePosition,

    #[error("{0} allele is empty")]
    EmptyAllele(AlleleField),

    #[error("{field} allele '{allele}' contains characters outside A/C/G/T")]
    InvalidAllele { field: AlleleField, allele: String },

    #[error("alternate allele cannot equal reference allele ({0})")]
    AlternateEqualsReference(String),

    #[error(
        "reference_reads ({reference_reads}) + alternate_reads ({alternate_reads}) exceeds depth ({depth})"
    )]
    ReadsExceedDepth {
        reference_reads: u32,
        alternate_reads: u32,
        depth: u32,
    },

    #[error("minor allele frequency {0} is outside [0, 1]")]
    FrequencyOutOfRange(f64),

    #[error("unknown variant class '{0}'")]
    UnknownVariantClass(String),
}

/// Unvalidated per-allele fields, as pulled out of a source record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariant {
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
    pub depth: u32,
    pub reference_reads: u32,
    pub alternate_reads: u32,
    pub minor_allele_frequency: f64,
    pub variant_class: VariantClass,
}

/// A validated single-allele variant call. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    chromosome: String,
    position: u64,
    reference: String,
    alternate: String,
    depth: u32,
    reference_reads: u32,
    alternate_reads: u32,
    minor_allele_frequency: f64,
    variant_class: VariantClass,
}

fn check_allele(field: AlleleField, allele: &str) -> Result<(), ValidationError> {
    if allele.is_empty() {
        return Err(ValidationError::EmptyAllele(field));
    }
    if !allele.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
        return Err(ValidationError::InvalidAllele {
            field,
            allele: allele.to_string(),
        });
    }
    Ok(())
}

impl TryFrom<RawVariant> for Variant {
    type Error = ValidationError;

    fn try_from(raw: RawVariant) -> Result<Self, Self::Error> {
        if raw.position == 0 {
            return Err(ValidationError::NonPositivePosition);
        }
        check_allele(AlleleField::Reference, &raw.reference)?;
        check_allele(AlleleField::Alternate, &raw.alternate)?;

        if raw.alternate == raw.reference {
            return Err(ValidationError::AlternateEqualsReference(raw.alternate));
        }

        // u64 sum so large counts can't wrap past the depth check
        if raw.reference_reads as u64 + raw.alternate_reads as u64 > raw.depth as u64 {
            return Err(ValidationError::ReadsExceedDepth {
                reference_reads: raw.reference_reads,
                alternate_reads: raw.alternate_reads,
                depth: raw.depth,
            });
        }

        if !(0.0..=1.0).contains(&raw.minor_allele_frequency) {
            return Err(ValidationError::FrequencyOutOfRange(
                raw.minor_allele_frequency,
            ));
        }

        Ok(Variant {
            chromosome: raw.chromosome,
            position: raw.position,
            reference: raw.reference,
            alternate: raw.alternate,
            depth: raw.depth,
            reference_reads: raw.reference_reads,
            alternate_reads: raw.alternate_reads,
            minor_allele_frequency: raw.minor_allele_frequency,
            variant_class: raw.variant_class,
        })
    }
}

impl Variant {
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// 1-based position of the first reference base.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alternate(&self) -> &str {
        &self.alternate
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn reference_reads(&self) -> u32 {
        self.reference_reads
    }

    pub fn alternate_reads(&self) -> u32 {
        self.alternate_reads
    }

    pub fn minor_allele_frequency(&self) -> f64 {
        self.minor_allele_frequency
    }

    pub fn variant_class(&self) -> VariantClass {
        self.variant_class
    }

    /// Percentage of informative reads supporting the alternate allele,
    /// rounded to two decimals. Zero when no reads are informative.
    pub fn alt_percent(&self) -> f64 {
        let informative = self.alternate_reads as f64 + self.reference_reads as f64;
        if informative == 0.0 {
            return 0.0;
        }
        round2(self.alternate_reads as f64 * 100.0 / informative)
    }
}

/// A variant merged with its lookup result.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedVariant {
    variant: Variant,
    alt_percent: f64,
    gene: Option<String>,
    consequence: Option<String>,
}

impl AnnotatedVariant {
    pub fn new(variant: Variant, gene: Option<String>, consequence: Option<String>) -> Self {
        let alt_percent = variant.alt_percent();
        Self {
            variant,
            alt_percent,
            gene,
            consequence,
        }
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn alt_percent(&self) -> f64 {
        self.alt_percent
    }

    pub fn gene(&self) -> Option<&str> {
        self.gene.as_deref()
    }

    pub fn consequence(&self) -> Option<&str> {
        self.consequence.as_deref()
    }
}

/// Class of a canonical genomic edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditClass {
    Sub,
    Ins,
    Del,
    Delins,
}

impl EditClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditClass::Sub => "sub",
            EditClass::Ins => "ins",
            EditClass::Del => "del",
            EditClass::Delins => "delins",
        }
    }
}

impl fmt::Display for EditClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal-span genomic notation for a single edit, e.g. `1:g.101_102del`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalNotation {
    pub notation: String,
    pub class: EditClass,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawVariant {
        RawVariant {
            chromosome: "1".to_string(),
            position: 931_393,
            reference: "G".to_string(),
            alternate: "T".to_string(),
            depth: 4124,
            reference_reads: 4029,
            alternate_reads: 95,
            minor_allele_frequency: 0.02,
            variant_class: VariantClass::Snp,
        }
    }

    #[test]
    fn test_valid_variant_builds() {
        let variant = Variant::try_from(raw()).unwrap();
        assert_eq!(variant.chromosome(), "1");
        assert_eq!(variant.position(), 931_393);
        assert_eq!(variant.variant_class(), VariantClass::Snp);
    }

    #[test]
    fn test_alternate_equal_to_reference_rejected() {
        let mut r = raw();
        r.alternate = "G".to_string();
        assert_eq!(
            Variant::try_from(r),
            Err(ValidationError::AlternateEqualsReference("G".to_string()))
        );
    }

    #[test]
    fn test_reads_exceeding_depth_rejected() {
        let mut r = raw();
        r.depth = 100;
        r.reference_reads = 60;
        r.alternate_reads = 41;
        assert_eq!(
            Variant::try_from(r),
            Err(ValidationError::ReadsExceedDepth {
                reference_reads: 60,
                alternate_reads: 41,
                depth: 100,
            })
        );
    }

    #[test]
    fn test_reads_equal_to_depth_accepted() {
        let mut r = raw();
        r.depth = 100;
        r.reference_reads = 60;
        r.alternate_reads = 40;
        assert!(Variant::try_from(r).is_ok());
    }

    #[test]
    fn test_allele_alphabet_enforced() {
        let mut r = raw();
        r.alternate = "N".to_string();
        assert!(matches!(
            Variant::try_from(r),
            Err(ValidationError::InvalidAllele {
                field: AlleleField::Alternate,
                ..
            })
        ));

        let mut r = raw();
        r.reference = "g".to_string();
        assert!(matches!(
            Variant::try_from(r),
            Err(ValidationError::InvalidAllele {
                field: AlleleField::Reference,
                ..
            })
        ));

        let mut r = raw();
        r.reference = String::new();
        assert_eq!(
            Variant::try_from(r),
            Err(ValidationError::EmptyAllele(AlleleField::Reference))
        );
    }

    #[test]
    fn test_position_and_frequency_bounds() {
        let mut r = raw();
        r.position = 0;
        assert_eq!(Variant::try_from(r), Err(ValidationError::NonPositivePosition));

        let mut r = raw();
        r.minor_allele_frequency = 1.5;
        assert!(matches!(
            Variant::try_from(r),
            Err(ValidationError::FrequencyOutOfRange(_))
        ));

        let mut r = raw();
        r.minor_allele_frequency = f64::NAN;
        assert!(Variant::try_from(r).is_err());
    }

    #[test]
    fn test_alt_percent() {
        let annotated = AnnotatedVariant::new(Variant::try_from(raw()).unwrap(), None, None);
        // 95 * 100 / 4124 = 2.3036...
        assert_eq!(annotated.alt_percent(), 2.3);

        let mut r = raw();
        r.reference_reads = 0;
        r.alternate_reads = 0;
        let annotated = AnnotatedVariant::new(Variant::try_from(r).unwrap(), None, None);
        assert_eq!(annotated.alt_percent(), 0.0);
    }

    #[test]
    fn test_variant_class_parsing() {
        assert_eq!("complex".parse::<VariantClass>().unwrap(), VariantClass::Complex);
        assert_eq!("SNP".parse::<VariantClass>().unwrap(), VariantClass::Snp);
        assert!("sv".parse::<VariantClass>().is_err());
        assert_eq!(VariantClass::Mnp.to_string(), "mnp");
    }
}
