pub mod errors;

pub use errors::{BdbError, BdbErrorCategory, BdbResult, ComputeResult, ParserResult};

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Version marker for a recognized program whose field carries no version.
pub const VERSION_ABSENT: &str = "-";
/// Version marker for a recognized program whose version could not be parsed.
pub const VERSION_NOT_PARSEABLE: &str = "np";
/// Interpreted name for segments no recognizer claims.
pub const OTHER_PROGRAM: &str = "OTHER";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProgramMention {
    pub raw: Option<String>,
    pub interpreted: Option<String>,
    pub version: Option<String>,
}

impl ProgramMention {
    pub fn new(raw: impl Into<String>, interpreted: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            raw: Some(raw.into()),
            interpreted: Some(interpreted.into()),
            version: version.map(str::to_string),
        }
    }

    /// The mention produced for "NULL", "NONE" and "NO REFINEMENT".
    pub fn unreported() -> Self {
        Self::default()
    }

    pub fn is_unreported(&self) -> bool {
        self.raw.is_none() && self.interpreted.is_none() && self.version.is_none()
    }

    pub fn is_other(&self) -> bool {
        self.interpreted.as_deref() == Some(OTHER_PROGRAM)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProvenanceDecision {
    pub winners: Vec<String>,
    pub trace: Vec<String>,
}

impl ProvenanceDecision {
    pub fn single(&self) -> Option<&str> {
        match self.winners.as_slice() {
            [winner] => Some(winner.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct VerificationResult {
    pub beq_identical: Option<f64>,
    pub correct_uij: Option<bool>,
}

impl VerificationResult {
    pub fn without_anisou() -> Self {
        Self::default()
    }

    pub fn has_anisou_data(&self) -> bool {
        self.beq_identical.is_some()
    }

    pub fn used_nonstandard_combination(&self) -> Option<bool> {
        self.correct_uij.map(|correct| !correct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BGroup {
    #[serde(rename = "overall")]
    Overall,
    #[serde(rename = "residue_1ADP")]
    Residue1Adp,
    #[serde(rename = "residue_2ADP")]
    Residue2Adp,
    #[serde(rename = "individual")]
    Individual,
    #[serde(rename = "no_b-factors")]
    NoBFactors,
}

impl BGroup {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::Residue1Adp => "residue_1ADP",
            Self::Residue2Adp => "residue_2ADP",
            Self::Individual => "individual",
            Self::NoBFactors => "no_b-factors",
        }
    }
}

impl Display for BGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BGroupResult {
    pub protein_b: Option<BGroup>,
    pub nucleic_b: Option<BGroup>,
    pub calpha_only: bool,
    pub phos_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BValueType {
    Residual,
    Unverified,
}

impl BValueType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Residual => "residual",
            Self::Unverified => "unverified",
        }
    }
}

impl Display for BValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Transform {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "multiply_by_8pi2")]
    MultiplyBy8Pi2,
    #[serde(rename = "run_tls_deconvolution")]
    RunTlsDeconvolution,
}

impl Transform {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MultiplyBy8Pi2 => "multiply_by_8pi2",
            Self::RunTlsDeconvolution => "run_tls_deconvolution",
        }
    }
}

impl Display for Transform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Includable(Transform),
    NotIncludable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionDecision {
    pub inclusion: Inclusion,
    pub message: String,
}

impl InclusionDecision {
    pub fn includable(transform: Transform, message: impl Into<String>) -> Self {
        Self {
            inclusion: Inclusion::Includable(transform),
            message: message.into(),
        }
    }

    pub fn not_includable(message: impl Into<String>) -> Self {
        Self {
            inclusion: Inclusion::NotIncludable,
            message: message.into(),
        }
    }

    pub fn is_includable(&self) -> bool {
        matches!(self.inclusion, Inclusion::Includable(_))
    }

    pub fn transform(&self) -> Option<Transform> {
        match self.inclusion {
            Inclusion::Includable(transform) => Some(transform),
            Inclusion::NotIncludable => None,
        }
    }
}

/// Textual and structural signals read from the header of one PDB file.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RefinementSignals {
    pub b_type: Option<BValueType>,
    pub b_msqav: bool,
    pub format_date: Option<String>,
    pub format_vers: Option<f64>,
    pub has_anisou: bool,
    pub other_refinement_remarks: Option<String>,
    pub refprog: Option<String>,
    pub tls_groups: Option<u32>,
    pub tls_residual: bool,
    pub tls_sum: bool,
}

impl RefinementSignals {
    pub fn has_tls_groups(&self) -> bool {
        self.tls_groups.is_some_and(|count| count > 0)
    }

    pub fn remarks(&self) -> &str {
        self.other_refinement_remarks.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSelection {
    pub chain_1: String,
    pub num_1: i32,
    pub icode_1: Option<char>,
    pub chain_2: String,
    pub num_2: i32,
    pub icode_2: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SkttlsSummary {
    pub skttls_tot: Option<u32>,
    #[serde(rename = "skttls_95th")]
    pub skttls_95th: Option<u32>,
    #[serde(rename = "skttls_99th")]
    pub skttls_99th: Option<u32>,
}

/// Refinement part of a databank entry, present when the experiment method is usable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementRecord {
    #[serde(flatten)]
    pub signals: RefinementSignals,
    #[serde(flatten)]
    pub verification: VerificationResult,
    pub ref_prog: Option<Vec<Option<String>>>,
    pub prog_inter: Option<Vec<Option<String>>>,
    pub prog_vers: Option<Vec<Option<String>>>,
    pub prog_last: Option<Vec<String>>,
    pub decision: String,
    pub is_bdb_includable: bool,
    pub assume_iso: bool,
    pub req_tlsanl: bool,
    pub transform: Option<Transform>,
    #[serde(flatten)]
    pub b_group: BGroupResult,
    #[serde(flatten)]
    pub skttls: SkttlsSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BdbEntry {
    pub pdb_id: String,
    pub expdta: Vec<String>,
    pub expdta_useful: bool,
    #[serde(flatten)]
    pub refinement: Option<RefinementRecord>,
}

#[cfg(test)]
mod tests {
    use super::{
        BGroup, InclusionDecision, ProgramMention, ProvenanceDecision, Transform,
        VerificationResult,
    };

    #[test]
    fn not_includable_decisions_carry_no_transform() {
        let decision = InclusionDecision::not_includable("REFMAC: residual and full B-factors");
        assert!(!decision.is_includable());
        assert_eq!(decision.transform(), None);

        let decision = InclusionDecision::includable(Transform::None, "REFMAC: probably full B-factors");
        assert!(decision.is_includable());
        assert_eq!(decision.transform(), Some(Transform::None));
    }

    #[test]
    fn unreported_mention_has_no_fields() {
        let mention = ProgramMention::unreported();
        assert!(mention.is_unreported());
        assert!(!ProgramMention::new("REFMAC 5.7", "REFMAC", Some("5.7")).is_unreported());
    }

    #[test]
    fn provenance_single_requires_exactly_one_winner() {
        let decision = ProvenanceDecision {
            winners: vec!["REFMAC".to_string()],
            trace: Vec::new(),
        };
        assert_eq!(decision.single(), Some("REFMAC"));

        let decision = ProvenanceDecision {
            winners: vec!["PHENIX.REFINE".to_string(), "REFMAC".to_string()],
            trace: Vec::new(),
        };
        assert_eq!(decision.single(), None);
    }

    #[test]
    fn verification_flags_follow_anisou_presence() {
        let absent = VerificationResult::without_anisou();
        assert!(!absent.has_anisou_data());
        assert_eq!(absent.used_nonstandard_combination(), None);

        let present = VerificationResult {
            beq_identical: Some(0.5),
            correct_uij: Some(false),
        };
        assert!(present.has_anisou_data());
        assert_eq!(present.used_nonstandard_combination(), Some(true));
    }

    #[test]
    fn enum_labels_match_serialized_values() {
        for group in [
            BGroup::Overall,
            BGroup::Residue1Adp,
            BGroup::Residue2Adp,
            BGroup::Individual,
            BGroup::NoBFactors,
        ] {
            let value = serde_json::to_value(group).expect("group should serialize");
            assert_eq!(value, serde_json::Value::String(group.as_str().to_string()));
        }
        for transform in [
            Transform::None,
            Transform::MultiplyBy8Pi2,
            Transform::RunTlsDeconvolution,
        ] {
            let value = serde_json::to_value(transform).expect("transform should serialize");
            assert_eq!(value, serde_json::Value::String(transform.as_str().to_string()));
        }
    }
}
