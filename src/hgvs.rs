//! Genomic (`g.`) notation for raw VCF-style allele pairs.
//!
//! The shared prefix is removed first and the event position advanced past
//! it; only then is the shared suffix removed from what remains. The
//! remaining reference/alternate spans decide the edit class.

use crate::types::{CanonicalNotation, EditClass};

/// Convert `(chromosome, position, reference, alternate)` into minimal-span
/// genomic notation.
///
/// `position` is 1-based and refers to the first base of `reference`.
/// Alleles are compared byte-for-byte and are expected to be non-empty and
/// distinct.
pub fn normalize(chrom: &str, position: u64, reference: &str, alternate: &str) -> CanonicalNotation {
    let (ref_core, alt_core, start) = trim_alleles(reference.as_bytes(), alternate.as_bytes(), position);
    let ref_len = ref_core.len();
    let alt = String::from_utf8_lossy(alt_core);

    match (ref_len, alt_core.len()) {
        (1, 1) => CanonicalNotation {
            notation: format!("{chrom}:g.{start}{}>{alt}", String::from_utf8_lossy(ref_core)),
            class: EditClass::Sub,
        },
        (1, 0) => CanonicalNotation {
            notation: format!("{chrom}:g.{start}del"),
            class: EditClass::Del,
        },
        (r, 0) if r > 1 => CanonicalNotation {
            notation: format!("{chrom}:g.{start}_{}del", start.saturating_add(r as u64 - 1)),
            class: EditClass::Del,
        },
        (0, _) => CanonicalNotation {
            // Between the flanking bases.
            notation: format!("{chrom}:g.{}_{start}ins{alt}", start.saturating_sub(1)),
            class: EditClass::Ins,
        },
        (r, _) => CanonicalNotation {
            notation: format!("{chrom}:g.{start}_{}delins{alt}", start.saturating_add(r as u64 - 1)),
            class: EditClass::Delins,
        },
    }
}

/// Strip the common prefix, then the common suffix of the remainders.
/// Returns the trimmed reference, trimmed alternate and the adjusted start.
fn trim_alleles<'a>(reference: &'a [u8], alternate: &'a [u8], position: u64) -> (&'a [u8], &'a [u8], u64) {
    let prefix = reference
        .iter()
        .zip(alternate)
        .take_while(|(r, a)| r == a)
        .count();

    let ref_rest = &reference[prefix..];
    let alt_rest = &alternate[prefix..];

    let suffix = ref_rest
        .iter()
        .rev()
        .zip(alt_rest.iter().rev())
        .take_while(|(r, a)| r == a)
        .count();

    (
        &ref_rest[..ref_rest.len() - suffix],
        &alt_rest[..alt_rest.len() - suffix],
        position.saturating_add(prefix as u64),
    )
}
