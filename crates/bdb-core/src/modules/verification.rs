//! Cross-checks ATOM B-factors against the equivalent isotropic B of their
//! ANISOU tensors.

use crate::common::constants::{BEQ_MARGIN, EIGHT_PI_SQUARED, is_close};
use crate::domain::{TlsSelection, VerificationResult};
use crate::parser::{Atom, Structure};
use tracing::{debug, error, info, warn};

/// `8π² (U11 + U22 + U33) / 3`
pub fn beq(tensor: &[f64; 6]) -> f64 {
    EIGHT_PI_SQUARED * (tensor[0] + tensor[1] + tensor[2]) / 3.0
}

pub fn verify_displacements(structure: &Structure) -> VerificationResult {
    verify_atoms(structure.atoms())
}

/// Fraction of atoms with a tensor whose B-factor is reproduced within
/// [`BEQ_MARGIN`], trying the non-standard orderings for atoms that fail the
/// standard Beq.
pub fn verify_atoms<'a>(atoms: impl IntoIterator<Item = &'a Atom>) -> VerificationResult {
    let mut reproduced = 0_usize;
    let mut missed = 0_usize;
    let mut correct_uij = true;

    for atom in atoms {
        let Some(tensor) = atom.anisou.as_ref() else {
            continue;
        };
        if is_close(atom.b_factor, beq(tensor), BEQ_MARGIN) {
            reproduced += 1;
        } else if check_combinations(tensor, atom.b_factor, BEQ_MARGIN) {
            debug!(
                "B-factor of atom {} reproduced with a non-standard combination of Uij values",
                atom.name
            );
            reproduced += 1;
            correct_uij = false;
        } else {
            missed += 1;
        }
    }

    let total = reproduced + missed;
    if total == 0 {
        return VerificationResult::without_anisou();
    }
    VerificationResult {
        beq_identical: Some(reproduced as f64 / total as f64),
        correct_uij: Some(correct_uij),
    }
}

/// Tries all 20 three-element subsets of the six tensor components as the
/// diagonal.
pub fn check_combinations(tensor: &[f64; 6], b_factor: f64, margin: f64) -> bool {
    for first in 0..4 {
        for second in first + 1..5 {
            for third in second + 1..6 {
                let trace = tensor[first] + tensor[second] + tensor[third];
                if is_close(b_factor, EIGHT_PI_SQUARED * trace / 3.0, margin) {
                    return true;
                }
            }
        }
    }
    false
}

pub fn report(result: &VerificationResult) {
    let Some(identical) = result.beq_identical else {
        debug!("No ANISOU records");
        return;
    };
    if result.used_nonstandard_combination() == Some(true) {
        warn!(
            "One or more B-factors could only be reproduced by a non-standard \
             combination of Uij values in the corresponding ANISOU record."
        );
    }
    if identical >= 1.0 {
        info!(
            "The B-factors in the ATOM records could all be reproduced within {} A**2 \
             by calculating Beq from the corresponding ANISOU records.",
            BEQ_MARGIN
        );
    } else {
        warn!(
            "{:.2}% of the B-factors in the ATOM records could not be reproduced within \
             {} A**2 by calculating Beq from the corresponding ANISOU records.",
            100.0 * (1.0 - identical),
            BEQ_MARGIN
        );
    }
}

/// False when the first or last residue of any selection is missing from the
/// first model.
pub fn check_tls_ranges(structure: &Structure, selections: &[TlsSelection]) -> bool {
    for selection in selections {
        let first = structure.find_residue(&selection.chain_1, selection.num_1, selection.icode_1);
        let last = structure.find_residue(&selection.chain_2, selection.num_2, selection.icode_2);
        if first.is_none() || last.is_none() {
            error!(
                "TLS group not (entirely) in structure: {} {}{} - {} {}{}",
                selection.chain_1,
                selection.num_1,
                selection.icode_1.map(String::from).unwrap_or_default(),
                selection.chain_2,
                selection.num_2,
                selection.icode_2.map(String::from).unwrap_or_default()
            );
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::{beq, check_combinations, check_tls_ranges, verify_displacements};
    use crate::common::constants::BEQ_MARGIN;
    use crate::domain::TlsSelection;
    use crate::parser::Structure;
    use crate::parser::fixtures::{anisou_line, atom_line};

    fn structure(atoms: &[(&str, f64, Option<[i64; 6]>)]) -> Structure {
        let mut lines = Vec::new();
        for (index, (name, b_factor, tensor)) in atoms.iter().enumerate() {
            let serial = index + 1;
            lines.push(atom_line(serial, name, "ALA", 'A', 1, 1.0, *b_factor));
            if let Some(tensor) = tensor {
                lines.push(anisou_line(serial, name, "ALA", 'A', 1, *tensor));
            }
        }
        Structure::from_source(&lines.join("\n")).expect("fixture should parse")
    }

    const ISOTROPIC: [i64; 6] = [2500, 2500, 2500, 0, 0, 0];
    const SWAPPED: [i64; 6] = [100, 100, 100, 2500, 2500, 2500];

    #[test]
    fn beq_of_isotropic_tensor() {
        assert!((beq(&[0.25, 0.25, 0.25, 0.0, 0.0, 0.0]) - 19.739_208_8).abs() < 1e-6);
    }

    #[test]
    fn identical_b_factors_are_all_reproduced() {
        let result = verify_displacements(&structure(&[
            ("N", 19.74, Some(ISOTROPIC)),
            ("CA", 19.73, Some(ISOTROPIC)),
        ]));
        assert_eq!(result.beq_identical, Some(1.0));
        assert_eq!(result.correct_uij, Some(true));
    }

    #[test]
    fn non_standard_ordering_counts_but_clears_correct_uij() {
        let result = verify_displacements(&structure(&[
            ("N", 19.74, Some(ISOTROPIC)),
            ("CA", 19.74, Some(SWAPPED)),
        ]));
        assert_eq!(result.beq_identical, Some(1.0));
        assert_eq!(result.correct_uij, Some(false));
        assert_eq!(result.used_nonstandard_combination(), Some(true));
    }

    #[test]
    fn standard_match_skips_the_combination_search() {
        let standard = verify_displacements(&structure(&[("N", 19.74, Some(ISOTROPIC))]));
        assert_eq!(standard.beq_identical, Some(1.0));
        assert_eq!(standard.correct_uij, Some(true));

        let swapped = verify_displacements(&structure(&[("N", 19.74, Some(SWAPPED))]));
        assert_eq!(swapped.beq_identical, Some(1.0));
        assert_eq!(swapped.correct_uij, Some(false));
    }

    #[test]
    fn result_does_not_depend_on_atom_order() {
        let atoms = [
            ("N", 19.74, Some(ISOTROPIC)),
            ("CA", 19.74, Some(SWAPPED)),
            ("C", 50.0, Some(ISOTROPIC)),
            ("O", 50.0, None),
            ("CB", 19.73, Some(ISOTROPIC)),
        ];
        let forward = verify_displacements(&structure(&atoms));
        let mut reversed = atoms;
        reversed.reverse();
        let mut rotated = atoms;
        rotated.rotate_left(2);

        assert_eq!(verify_displacements(&structure(&reversed)), forward);
        assert_eq!(verify_displacements(&structure(&rotated)), forward);
        assert_eq!(forward.correct_uij, Some(false));
        let fraction = forward.beq_identical.expect("tensors are present");
        assert!((fraction - 0.75).abs() < 1e-12);
    }

    #[test]
    fn unreproduced_b_factors_lower_the_fraction() {
        let result = verify_displacements(&structure(&[
            ("N", 19.74, Some(ISOTROPIC)),
            ("CA", 19.74, Some(ISOTROPIC)),
            ("C", 50.0, Some(ISOTROPIC)),
            ("O", 50.0, None),
        ]));
        let fraction = result.beq_identical.expect("tensors are present");
        assert!((fraction - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.correct_uij, Some(true));
    }

    #[test]
    fn atoms_without_tensors_give_no_result() {
        let result = verify_displacements(&structure(&[("N", 19.74, None)]));
        assert_eq!(result.beq_identical, None);
        assert_eq!(result.correct_uij, None);
    }

    #[test]
    fn combinations_cover_off_diagonal_subsets() {
        let tensor = [0.01, 0.01, 0.01, 0.25, 0.25, 0.25];
        assert!(check_combinations(&tensor, 19.74, BEQ_MARGIN));
        assert!(check_combinations(&tensor, 0.79, BEQ_MARGIN));
        assert!(!check_combinations(&tensor, 50.0, BEQ_MARGIN));
    }

    #[test]
    fn tls_ranges_must_exist_in_the_structure() {
        let mut lines = Vec::new();
        for seq in 1..=3 {
            lines.push(atom_line(seq as usize, "CA", "GLY", 'A', seq, 1.0, 20.0));
        }
        let structure = Structure::from_source(&lines.join("\n")).expect("fixture should parse");
        let selection = |first: i32, last: i32| TlsSelection {
            chain_1: "A".to_string(),
            num_1: first,
            icode_1: None,
            chain_2: "A".to_string(),
            num_2: last,
            icode_2: None,
        };

        assert!(check_tls_ranges(&structure, &[selection(1, 3)]));
        assert!(!check_tls_ranges(&structure, &[selection(1, 3), selection(2, 4)]));
        assert!(check_tls_ranges(&structure, &[]));
    }
}
