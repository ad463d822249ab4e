//! Tolerances and thresholds shared by the classifier components.
//!
//! All B-factor tolerances are in Å².

use std::f64::consts::PI;

/// Conversion factor between a mean-square displacement U and a B-factor.
pub const EIGHT_PI_SQUARED: f64 = 8.0 * PI * PI;

/// Absolute tolerance when comparing a B-factor with Beq from ANISOU.
pub const BEQ_MARGIN: f64 = 0.015;
/// Fraction of reproduced B-factors above which the header is not consulted.
pub const BEQ_IDENTICAL_THRESHOLD: f64 = 0.9999;

/// Absolute tolerance when grouping B-factors within a residue.
pub const B_GROUP_MARGIN: f64 = 0.01;
/// Usable residues inspected per chain.
pub const B_GROUP_MAX_RESIDUES: usize = 10;
/// Minimal share of CA (or P) atoms for a chain to count as a trace.
pub const TRACE_ATOM_FRACTION: f64 = 0.75;

/// Relative tolerance applied on top of the absolute margins.
pub const CLOSENESS_RTOL: f64 = 1.0e-5;
/// Absolute tolerance used when testing B-factors against zero.
pub const ZERO_ATOL: f64 = 1.0e-8;

/// PDB format version written by the 2011 wwPDB remediation.
pub const REMEDIATION_2011_FORMAT: f64 = 3.30;

/// Output files of TLSANL at or below this size are considered broken.
pub const TLSANL_MIN_OUTPUT_BYTES: u64 = 2000;
pub const TLSANL_KEYWORDED_INPUT: &str = "BINPUT t\nBRESID t\nISOOUT FULL\nNUMERIC\nEND\n";

/// `a` and `b` are close when `|a - b| <= atol + rtol * |b|`.
pub fn is_close(a: f64, b: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + CLOSENESS_RTOL * b.abs()
}

pub fn is_remediation_2011_format(format_vers: Option<f64>) -> bool {
    format_vers.is_some_and(|version| (version - REMEDIATION_2011_FORMAT).abs() < 1.0e-9)
}

#[cfg(test)]
mod tests {
    use super::{
        BEQ_MARGIN, EIGHT_PI_SQUARED, is_close, is_remediation_2011_format, ZERO_ATOL,
    };

    #[test]
    fn eight_pi_squared_matches_reference_value() {
        assert!((EIGHT_PI_SQUARED - 78.956_835_208_714_86).abs() <= 1.0e-10);
    }

    #[test]
    fn closeness_uses_absolute_and_relative_terms() {
        assert!(is_close(10.0, 10.015, BEQ_MARGIN));
        assert!(!is_close(10.0, 10.03, BEQ_MARGIN));
        assert!(is_close(0.0, 0.0, ZERO_ATOL));
        assert!(!is_close(0.001, 0.0, ZERO_ATOL));
    }

    #[test]
    fn remediation_format_matches_version_3_30_only() {
        assert!(is_remediation_2011_format(Some(3.30)));
        assert!(is_remediation_2011_format("3.30".parse().ok()));
        assert!(!is_remediation_2011_format(Some(3.20)));
        assert!(!is_remediation_2011_format(None));
    }
}
