pub mod annotate;
pub mod hgvs;
