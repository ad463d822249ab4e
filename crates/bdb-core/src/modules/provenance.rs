//! Educated guess of the refinement program that was used last.
//!
//! The precedence pairs follow published program combinations: when both
//! programs of a pair are listed, the first is assumed to have been run
//! before the second.

use crate::domain::{ProgramMention, ProvenanceDecision};
use tracing::debug;

/// Model building, validation and data processing tools that do not refine.
pub const NON_REFINEMENT_PROGRAMS: &[&str] = &[
    "ARP",
    "ARP/WARP",
    "CHAIN",
    "COOT",
    "DM",
    "FRODO",
    "HKL-3000",
    "LAFIRE",
    "MOLPROBITY",
    "O",
    "OOPS",
    "PIKSOL",
    "PRODRG",
    "PROTEIN",
    "QUANTA",
    "SCWRL",
    "SFALL",
    "SOLVE/RESOLVE",
    "TOM",
    "TOM/FRODO",
    "XFIT",
    "XPLEO",
    "XTALVIEW",
];

/// (used first, used last)
pub const PRECEDENCE_PAIRS: &[(&str, &str)] = &[
    ("CCP4", "CNS"),
    ("CCP4", "X-PLOR"),
    ("CNS", "BUSTER"),
    ("CNS", "PHENIX.REFINE"),
    ("CNS", "REFMAC"),
    ("CNS", "TNT"),
    ("CNX", "BUSTER"),
    ("CNX", "PHENIX.REFINE"),
    ("CNX", "REFMAC"),
    ("CNX", "TNT"),
    ("EREF", "PROLSQ"),
    ("EREF", "X-PLOR"),
    ("PROLSQ", "TNT"),
    ("PROLSQ", "REFMAC"),
    ("REFMAC", "MAIN"),
    ("RESTRAIN", "X-PLOR"),
    ("TWIN_LSQ", "CNS"),
    ("TNT", "REFMAC"),
    ("X-PLOR", "BUSTER"),
    ("X-PLOR", "CNS"),
    ("X-PLOR", "PHENIX.REFINE"),
    ("X-PLOR", "PROLSQ"),
    ("X-PLOR", "REFMAC"),
    ("X-PLOR", "TNT"),
];

const SHELX: &str = "SHELX";
const CORELS: &str = "CORELS";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    program: String,
    version: Option<String>,
}

/// Resolves the last-used program from normalized mentions.
pub fn resolve_last_used(mentions: &[ProgramMention]) -> ProvenanceDecision {
    let pairs: Vec<(String, Option<String>)> = mentions
        .iter()
        .filter_map(|mention| {
            mention
                .interpreted
                .clone()
                .map(|program| (program, mention.version.clone()))
        })
        .collect();
    resolve_pairs(&pairs)
}

/// Resolves the last-used program from (interpreted, version) pairs.
pub fn resolve_pairs(pairs: &[(String, Option<String>)]) -> ProvenanceDecision {
    let mut trace = Vec::new();

    let mut candidates: Vec<Candidate> = Vec::new();
    for (program, version) in pairs {
        if NON_REFINEMENT_PROGRAMS.contains(&program.as_str()) {
            trace.push(format!("removed non-refinement program {}", program));
            continue;
        }
        if candidates
            .iter()
            .any(|candidate| candidate.program.eq_ignore_ascii_case(program))
        {
            trace.push(format!("removed duplicate mention of {}", program));
            continue;
        }
        candidates.push(Candidate {
            program: program.clone(),
            version: version.clone(),
        });
    }

    if candidates.len() > 1 {
        if let Some(index) = position(&candidates, SHELX) {
            let refines = candidates
                .iter()
                .filter(|candidate| candidate.program == SHELX)
                .any(|candidate| {
                    candidate
                        .version
                        .as_deref()
                        .is_some_and(|version| version.contains(['L', 'H']))
                });
            if refines {
                trace.push("SHELXL/SHELXH listed with other programs, SHELX used last".to_string());
                return finish(vec![SHELX.to_string()], trace);
            }
            candidates.remove(index);
            trace.push("removed SHELX without L/H version".to_string());
        }
    }

    if candidates.len() > 1 {
        if let Some(index) = position(&candidates, CORELS) {
            candidates.remove(index);
            trace.push("removed CORELS, used first".to_string());
        }
    }

    let mut programs: Vec<String> = candidates.into_iter().map(|candidate| candidate.program).collect();
    for (loser, winner) in PRECEDENCE_PAIRS {
        if one_of_the_two(&mut programs, loser, winner) {
            trace.push(format!("{} used before {}", loser, winner));
        }
    }

    finish(programs, trace)
}

/// Removes `loser` when both `loser` and `winner` are present.
pub fn one_of_the_two(programs: &mut Vec<String>, loser: &str, winner: &str) -> bool {
    if loser == winner || !programs.iter().any(|program| program == winner) {
        return false;
    }
    match programs.iter().position(|program| program == loser) {
        Some(index) => {
            programs.remove(index);
            true
        }
        None => false,
    }
}

fn position(candidates: &[Candidate], program: &str) -> Option<usize> {
    candidates
        .iter()
        .position(|candidate| candidate.program == program)
}

fn finish(mut winners: Vec<String>, trace: Vec<String>) -> ProvenanceDecision {
    winners.sort();
    for step in &trace {
        debug!("Last-used program: {}", step);
    }
    ProvenanceDecision { winners, trace }
}

#[cfg(test)]
mod tests {
    use super::{one_of_the_two, resolve_last_used, resolve_pairs};
    use crate::domain::ProgramMention;

    fn pairs(programs: &[&str], versions: &[&str]) -> Vec<(String, Option<String>)> {
        programs
            .iter()
            .zip(versions)
            .map(|(program, version)| (program.to_string(), Some(version.to_string())))
            .collect()
    }

    fn winners(programs: &[&str], versions: &[&str]) -> Vec<String> {
        resolve_pairs(&pairs(programs, versions)).winners
    }

    #[test]
    fn precedence_pairs_leave_the_modern_programs() {
        assert_eq!(
            winners(&["X-PLOR", "CNS", "REFMAC", "PHENIX.REFINE"], &["-", "-", "-", "-"]),
            vec!["PHENIX.REFINE", "REFMAC"]
        );
        assert_eq!(winners(&["TNT", "REFMAC"], &["-", "-"]), vec!["REFMAC"]);
        assert_eq!(winners(&["REFMAC", "MAIN"], &["-", "-"]), vec!["MAIN"]);
    }

    #[test]
    fn output_is_sorted() {
        assert_eq!(winners(&["B", "A"], &["-", "-"]), vec!["A", "B"]);
    }

    #[test]
    fn non_refinement_programs_are_removed_even_if_nothing_remains() {
        assert!(winners(&["SOLVE/RESOLVE", "TOM/FRODO", "XTALVIEW"], &["-", "-", "-"]).is_empty());
        assert_eq!(winners(&["REFMAC", "COOT", "O"], &["5.8", "-", "-"]), vec!["REFMAC"]);
    }

    #[test]
    fn shelx_wins_only_with_l_or_h() {
        assert_eq!(winners(&["REFMAC", "SHELX"], &["5.8", "L"]), vec!["SHELX"]);
        assert_eq!(winners(&["REFMAC", "SHELX"], &["5.6", "-"]), vec!["REFMAC"]);
        assert_eq!(winners(&["SHELX"], &["S"]), vec!["SHELX"]);

        let missing_version = vec![
            ("REFMAC".to_string(), Some("5.8".to_string())),
            ("SHELX".to_string(), None),
        ];
        assert_eq!(resolve_pairs(&missing_version).winners, vec!["REFMAC"]);
    }

    #[test]
    fn corels_is_dropped_when_others_remain() {
        assert_eq!(winners(&["CORELS", "TNT"], &["-", "-"]), vec!["TNT"]);
        assert_eq!(winners(&["CORELS"], &["-"]), vec!["CORELS"]);
    }

    #[test]
    fn duplicates_keep_the_first_version() {
        let decision = resolve_pairs(&pairs(&["X-PLOR", "X-PLOR"], &["3.1", "3.8"]));
        assert_eq!(decision.winners, vec!["X-PLOR"]);
        assert!(decision.trace.iter().any(|step| step.contains("duplicate")));
    }

    #[test]
    fn unreported_mentions_resolve_to_nothing() {
        let decision = resolve_last_used(&[ProgramMention::unreported()]);
        assert!(decision.winners.is_empty());
    }

    #[test]
    fn one_of_the_two_requires_both_programs() {
        let mut programs = vec!["CNS".to_string()];
        assert!(!one_of_the_two(&mut programs, "CNS", "REFMAC"));
        programs.push("REFMAC".to_string());
        assert!(one_of_the_two(&mut programs, "CNS", "REFMAC"));
        assert_eq!(programs, vec!["REFMAC"]);
        assert!(!one_of_the_two(&mut programs, "REFMAC", "REFMAC"));
    }
}
