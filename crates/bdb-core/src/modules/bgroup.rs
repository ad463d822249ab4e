//! Most likely B-factor parameterization of the first protein and nucleic
//! acid chains.
//!
//! Only the first ten usable residues of a chain are inspected and a uniform
//! parameterization is assumed for the rest of the structure.

use crate::common::constants::{
    B_GROUP_MARGIN, B_GROUP_MAX_RESIDUES, TRACE_ATOM_FRACTION, ZERO_ATOL, is_close,
};
use crate::domain::{BGroup, BGroupResult};
use crate::parser::{Atom, Chain, Residue, Structure};
use tracing::{debug, error, info, warn};

const AMINO_ACID_BACKBONE: &[&str] = &["N", "CA", "C", "O"];
const SUGAR_PHOSPHATE_BACKBONE: &[&str] = &[
    "P", "OP1", "OP2", "O5'", "C5'", "C4'", "O4'", "C3'", "O3'", "C2'", "C1'",
];

/// Fewer distinct B values than this across the examined residues means an
/// overall B-factor (or two of them).
const OVERALL_DISTINCT_VALUES: usize = 4;

pub fn classify_structure(structure: &Structure) -> BGroupResult {
    let mut result = BGroupResult::default();
    info!("Determining most likely B-factor group type");

    for chain in &structure.chains {
        if is_protein_chain(chain) {
            if result.protein_b.is_none() {
                result.protein_b = Some(classify_chain(chain));
            }
        } else if is_nucleic_chain(chain) {
            if result.nucleic_b.is_none() {
                result.nucleic_b = Some(classify_chain(chain));
            }
        } else if is_calpha_trace(chain) {
            if result.protein_b.is_none() {
                info!("Calpha-only chain(s) present");
                result.calpha_only = true;
                result.protein_b = Some(classify_chain(chain));
            }
        } else if is_phos_trace(chain) {
            if result.nucleic_b.is_none() {
                info!("Backbone phosphorus-only chain(s) present");
                result.phos_only = true;
                result.nucleic_b = Some(classify_chain(chain));
            }
        } else {
            error!(
                "Chain {}: no protein or nucleic acid chain found (of sufficient length).",
                chain.id
            );
        }
    }

    info!(
        "Most likely B-factor group type protein: {} | nucleic acid: {}.",
        label(result.protein_b),
        label(result.nucleic_b)
    );
    result
}

fn label(group: Option<BGroup>) -> &'static str {
    group.map_or("not present", BGroup::as_str)
}

pub fn classify_chain(chain: &Chain) -> BGroup {
    let mut examined: Vec<Vec<f64>> = Vec::new();
    let mut votes = Votes::default();

    for residue in chain.standard_residues() {
        if examined.len() >= B_GROUP_MAX_RESIDUES {
            break;
        }
        let mut b_factors: Vec<f64> = residue
            .atoms
            .iter()
            .filter(|atom| is_usable(atom))
            .map(|atom| atom.b_factor)
            .collect();
        if b_factors.is_empty() {
            continue;
        }
        if b_factors.len() > 1 {
            b_factors.sort_by(f64::total_cmp);
            votes.add(residue_vote(&b_factors));
        }
        examined.push(b_factors);
    }
    if examined.len() < B_GROUP_MAX_RESIDUES {
        warn!(
            "Chain {} has less than {} useful residues composed of ATOMs.",
            chain.id, B_GROUP_MAX_RESIDUES
        );
    }
    debug!("Chain {} B-factor group votes: {:?}", chain.id, votes);

    let group = votes.winner();
    if examined.len() < B_GROUP_MAX_RESIDUES {
        return group;
    }

    let mut all: Vec<f64> = examined.into_iter().flatten().collect();
    all.sort_by(f64::total_cmp);
    let (Some(&lowest), Some(&highest)) = (all.first(), all.last()) else {
        return group;
    };
    if is_close(lowest, highest, B_GROUP_MARGIN) {
        if is_close(lowest, 0.0, ZERO_ATOL) && is_close(highest, 0.0, ZERO_ATOL) {
            return BGroup::NoBFactors;
        }
        return BGroup::Overall;
    }
    all.dedup();
    if all.len() < OVERALL_DISTINCT_VALUES {
        return BGroup::Overall;
    }
    group
}

/// Heavy, occupied atom.
fn is_usable(atom: &Atom) -> bool {
    !atom.name.starts_with('H') && atom.occupancy > 0.0
}

/// `sorted` holds at least two values in ascending order.
fn residue_vote(sorted: &[f64]) -> BGroup {
    let n = sorted.len();
    if is_close(sorted[n - 1], sorted[0], B_GROUP_MARGIN) {
        BGroup::Residue1Adp
    } else if n > 3
        && is_close(sorted[n - 1], sorted[n - 2], B_GROUP_MARGIN)
        && is_close(sorted[1], sorted[0], B_GROUP_MARGIN)
        && !is_close(sorted[n - 2], sorted[1], B_GROUP_MARGIN)
    {
        BGroup::Residue2Adp
    } else {
        BGroup::Individual
    }
}

#[derive(Debug, Default)]
struct Votes {
    /// (group, count) in order of first vote
    counts: Vec<(BGroup, usize)>,
}

impl Votes {
    fn add(&mut self, group: BGroup) {
        match self.counts.iter_mut().find(|(voted, _)| *voted == group) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((group, 1)),
        }
    }

    /// Most common vote; ties go to the most detailed tied model.
    fn winner(&self) -> BGroup {
        let Some(top) = self.counts.iter().map(|(_, count)| *count).max() else {
            return BGroup::Individual;
        };
        let leaders: Vec<BGroup> = self
            .counts
            .iter()
            .filter(|(_, count)| *count == top)
            .map(|(group, _)| *group)
            .collect();
        if leaders.len() == 1 {
            return leaders[0];
        }
        if leaders.contains(&BGroup::Individual) {
            BGroup::Individual
        } else if leaders.contains(&BGroup::Residue2Adp) {
            BGroup::Residue2Adp
        } else {
            BGroup::Residue1Adp
        }
    }
}

fn has_backbone(residue: &Residue, backbone: &[&str]) -> bool {
    backbone.iter().all(|name| residue.has_atom(name))
}

/// The first ten standard residues carry N, CA, C and O.
pub fn is_protein_chain(chain: &Chain) -> bool {
    leading_backbones(chain.standard_residues(), AMINO_ACID_BACKBONE)
}

/// The ten standard residues after the first residue carry the full
/// sugar-phosphate backbone. The first residue has no phosphate.
pub fn is_nucleic_chain(chain: &Chain) -> bool {
    let after_first = chain
        .residues
        .iter()
        .skip(1)
        .filter(|residue| residue.is_standard());
    leading_backbones(after_first, SUGAR_PHOSPHATE_BACKBONE)
}

fn leading_backbones<'a>(
    residues: impl Iterator<Item = &'a Residue>,
    backbone: &[&str],
) -> bool {
    let mut checked = 0;
    for residue in residues.take(B_GROUP_MAX_RESIDUES) {
        if !has_backbone(residue, backbone) {
            return false;
        }
        checked += 1;
    }
    checked > 0
}

pub fn is_calpha_trace(chain: &Chain) -> bool {
    atom_fraction(chain, "CA") >= TRACE_ATOM_FRACTION
}

pub fn is_phos_trace(chain: &Chain) -> bool {
    atom_fraction(chain, "P") >= TRACE_ATOM_FRACTION
}

fn atom_fraction(chain: &Chain, name: &str) -> f64 {
    let (matching, total) = chain.atoms().fold((0_usize, 0_usize), |(matching, total), atom| {
        (matching + usize::from(atom.name == name), total + 1)
    });
    if total == 0 {
        return 0.0;
    }
    matching as f64 / total as f64
}
