use crate::hgvs;
use crate::types::CanonicalNotation;
use anyhow::Result;

pub fn run(chrom: String, pos: u64, reference: String, alternate: String) -> Result<()> {
    let canonical = notation(&chrom, pos, &reference, &alternate)?;
    println!("{}\t{}", canonical.notation, canonical.class);
    Ok(())
}

fn notation(chrom: &str, pos: u64, reference: &str, alternate: &str) -> Result<CanonicalNotation> {
    if pos == 0 {
        anyhow::bail!("Position must be 1-based");
    }
    if pos.checked_add(reference.len() as u64).is_none() {
        anyhow::bail!("Reference allele at {} runs past the end of the coordinate space", pos);
    }
    if reference.eq_ignore_ascii_case(alternate) {
        anyhow::bail!("Reference and alternate alleles are identical");
    }

    Ok(hgvs::normalize(
        chrom,
        pos,
        &reference.to_ascii_uppercase(),
        &alternate.to_ascii_uppercase(),
    ))
}
