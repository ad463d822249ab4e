//! Combines the refinement program, REMARK 3 signals and ANISOU verification
//! into an inclusion decision.
//!
//! Every path ends in exactly one [`InclusionDecision`]. Includable decisions
//! carry the transform that produces full isotropic B-factors, the others a
//! reason that ends up in the WHY NOT file.

use crate::common::constants::{BEQ_IDENTICAL_THRESHOLD, is_remediation_2011_format};
use crate::domain::{
    BValueType, InclusionDecision, ParserResult, ProgramMention, ProvenanceDecision,
    RefinementSignals, Transform, VerificationResult,
};
use crate::modules::provenance::resolve_last_used;
use crate::modules::refprog::TextNormalizer;
use crate::modules::remarks::RemarkPredicates;
use tracing::{debug, error, info, warn};

const REFMAC: &str = "REFMAC";
const RESTRAIN: &str = "RESTRAIN";
const BEQ_NOT_REPRODUCED: &str = "Not enough B-factors could be reproduced from ANISOU records";
const BEQ_REPRODUCED: &str = "Assuming full isotropic B-factors because enough B-factors could be reproduced from the ANISOU records";

/// Every resolved program is currently accepted.
pub fn is_includable_program(_program: &str) -> bool {
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementOutcome {
    pub decision: InclusionDecision,
    /// The B-factors are taken to be full isotropic B-factors.
    pub assume_iso: bool,
    /// TLSANL has to reconstruct full B-factors.
    pub req_tlsanl: bool,
    pub mentions: Option<Vec<ProgramMention>>,
    pub provenance: Option<ProvenanceDecision>,
}

/// Decision reached on one path before the outcome is assembled.
#[derive(Debug)]
struct Verdict {
    message: String,
    transform: Option<Transform>,
    assume_iso: bool,
    req_tlsanl: bool,
}

impl Verdict {
    fn rejected(message: String) -> Self {
        Self {
            message,
            transform: None,
            assume_iso: false,
            req_tlsanl: false,
        }
    }

    fn accepted(message: String, transform: Transform) -> Self {
        Self {
            message,
            transform: Some(transform),
            assume_iso: transform == Transform::None,
            req_tlsanl: false,
        }
    }

    /// Full B-factors, includable only when `acceptable`.
    fn full_if(message: String, acceptable: bool) -> Self {
        Self {
            message,
            transform: acceptable.then_some(Transform::None),
            assume_iso: true,
            req_tlsanl: false,
        }
    }

    /// Residual B-factors that TLSANL can complete.
    fn residual_if(message: String, acceptable: bool) -> Self {
        Self {
            message,
            transform: acceptable.then_some(Transform::RunTlsDeconvolution),
            assume_iso: false,
            req_tlsanl: true,
        }
    }

    fn into_decision(self) -> (InclusionDecision, bool, bool) {
        let decision = match self.transform {
            Some(transform) => {
                info!("{}", self.message);
                InclusionDecision::includable(transform, self.message)
            }
            None => {
                warn!("{}.", self.message);
                InclusionDecision::not_includable(self.message)
            }
        };
        (decision, self.assume_iso, self.req_tlsanl)
    }
}

#[derive(Debug)]
pub struct RefinementDecisionEngine {
    normalizer: TextNormalizer,
    predicates: RemarkPredicates,
}

impl RefinementDecisionEngine {
    pub fn new() -> ParserResult<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            predicates: RemarkPredicates::new()?,
        })
    }

    pub fn predicates(&self) -> &RemarkPredicates {
        &self.predicates
    }

    pub fn decide(
        &self,
        signals: &RefinementSignals,
        verification: &VerificationResult,
    ) -> RefinementOutcome {
        let mentions = signals
            .refprog
            .as_deref()
            .map(|field| self.normalizer.normalize(field));
        let provenance = mentions.as_deref().map(resolve_last_used);
        if let (Some(mentions), Some(provenance)) = (&mentions, &provenance) {
            for mention in mentions {
                debug!(
                    "Refinement program: {:?} - interpreted as: {:?} - version: {:?} - last used: {:?}.",
                    mention.raw, mention.interpreted, mention.version, provenance.winners
                );
            }
        }

        let reproduced = signals.has_anisou
            && verification
                .beq_identical
                .is_some_and(|identical| identical > BEQ_IDENTICAL_THRESHOLD);

        let (decision, assume_iso, req_tlsanl) = if reproduced {
            info!("{}", BEQ_REPRODUCED);
            if let Some(provenance) = provenance.as_ref().filter(|p| !p.winners.is_empty()) {
                info!("{}: probably full B-factors.", provenance.winners.join(" and "));
            }
            (InclusionDecision::includable(Transform::None, BEQ_REPRODUCED), true, false)
        } else {
            match (&mentions, &provenance) {
                (Some(mentions), Some(provenance)) => {
                    self.decide_program(mentions, provenance, signals).into_decision()
                }
                _ => Verdict::rejected("No refinement program found".to_string()).into_decision(),
            }
        };

        RefinementOutcome {
            decision,
            assume_iso,
            req_tlsanl,
            mentions,
            provenance,
        }
    }

    fn decide_program(
        &self,
        mentions: &[ProgramMention],
        provenance: &ProvenanceDecision,
        signals: &RefinementSignals,
    ) -> Verdict {
        if mentions.is_empty() {
            error!("Refinement program parse error.");
            return Verdict::rejected("Refinement program parse error".to_string());
        }
        let Some(program) = provenance.single() else {
            if provenance.winners.is_empty() {
                let message = "Program(s) in REMARK 3 not interpreted as refinement program(s)";
                error!("{}.", message);
                return Verdict::rejected(message.to_string());
            }
            return Verdict::rejected(format!(
                "Combination of refinement programs cannot (yet) be included in the bdb: {}",
                provenance.winners.join(" and ")
            ));
        };
        info!("Interpreted last-used refinement program: {}.", program);

        let prefix = format!("{}: ", program);
        if !is_includable_program(program) {
            return Verdict::rejected(format!("{}this program cannot (yet) be included", prefix));
        }

        let remarks = signals.remarks();
        if program == RESTRAIN {
            return self.decide_restrain(&prefix, signals, remarks);
        }
        let remediation_2011 = is_remediation_2011_format(signals.format_vers);
        if signals.b_type.is_some() || (remediation_2011 && program == REFMAC) {
            return decide_remediation(&prefix, program, signals);
        }
        if signals.tls_residual && signals.tls_sum {
            return Verdict::rejected(format!("{}residual and full B-factors (REMARK 3)", prefix));
        }
        if signals.has_tls_groups() {
            self.decide_tls(&prefix, program, signals, remarks)
        } else {
            self.decide_notls(&prefix, program, signals, remarks)
        }
    }

    fn decide_restrain(&self, prefix: &str, signals: &RefinementSignals, remarks: &str) -> Verdict {
        if signals.b_msqav {
            Verdict::accepted(
                format!("{}B-factor field contains mean square atomic displacement (REMARK 3)", prefix),
                Transform::MultiplyBy8Pi2,
            )
        } else if self.predicates.u_quantity(remarks) {
            Verdict::rejected(format!("{}B-factor field contains \"U\" (REMARK 3)", prefix))
        } else if signals.b_type.is_some()
            || signals.has_anisou
            || signals.has_tls_groups()
            || signals.tls_residual
            || signals.tls_sum
        {
            Verdict::rejected(format!("{}unexpected content cannot (yet) be handled", prefix))
        } else {
            Verdict::accepted(format!("{}probably full B-factors", prefix), Transform::None)
        }
    }

    fn decide_tls(
        &self,
        prefix: &str,
        program: &str,
        signals: &RefinementSignals,
        remarks: &str,
    ) -> Verdict {
        let refmac = program == REFMAC;
        if signals.tls_residual {
            if signals.has_anisou {
                Verdict::rejected(format!(
                    "{}TLS group(s), residual B-factors (REMARK 3) and ANISOU records. {}",
                    prefix, BEQ_NOT_REPRODUCED
                ))
            } else {
                Verdict::residual_if(
                    format!(
                        "{}TLS group(s), residual B-factors (REMARK 3) without ANISOU records",
                        prefix
                    ),
                    refmac,
                )
            }
        } else if signals.tls_sum {
            if signals.has_anisou {
                Verdict::rejected(format!(
                    "{}TLS group(s), full B-factors (REMARK 3) and ANISOU records. {}",
                    prefix, BEQ_NOT_REPRODUCED
                ))
            } else {
                Verdict::full_if(
                    format!("{}TLS group(s), full B-factors (REMARK 3) without ANISOU records", prefix),
                    refmac,
                )
            }
        } else if self.tls_b_type_hint(refmac, remarks) {
            Verdict::rejected(format!(
                "{}TLS group(s) and, possibly, residual or full B-factors (REMARK 3, unrecognized format)",
                prefix
            ))
        } else if signals.has_anisou {
            Verdict::rejected(format!(
                "{}TLS group(s), no B-factor type details (REMARK 3). {}",
                prefix, BEQ_NOT_REPRODUCED
            ))
        } else {
            Verdict::rejected(format!(
                "{}TLS group(s), no B-factor type details (REMARK 3) and no ANISOU records",
                prefix
            ))
        }
    }

    fn decide_notls(
        &self,
        prefix: &str,
        program: &str,
        signals: &RefinementSignals,
        remarks: &str,
    ) -> Verdict {
        let refmac = program == REFMAC;
        let anisou_suffix = |message: String| {
            if signals.has_anisou {
                format!("{}. {}", message, BEQ_NOT_REPRODUCED)
            } else {
                message
            }
        };

        if self.predicates.tls_mention(remarks) {
            let message = anisou_suffix(format!("{}TLS remark without TLS group(s)", prefix));
            if signals.tls_sum {
                Verdict::full_if(format!("{}. Full B-factors (REMARK 3)", message), refmac)
            } else if signals.tls_residual {
                Verdict::residual_if(format!("{}. Residual B-factors (REMARK 3)", message), refmac)
            } else {
                Verdict::rejected(message)
            }
        } else if signals.tls_residual {
            Verdict::rejected(anisou_suffix(format!(
                "{}residual B-factors without TLS group(s) (REMARK 3)",
                prefix
            )))
        } else if signals.tls_sum {
            Verdict::rejected(anisou_suffix(format!(
                "{}full B-factors without TLS group(s) (REMARK 3)",
                prefix
            )))
        } else if self.possible_b_type(remarks) {
            Verdict::rejected(anisou_suffix(format!(
                "{}possibly, residual or full B-factors (REMARK 3, unrecognized format). No TLS groups",
                prefix
            )))
        } else if signals.has_anisou {
            Verdict::rejected(format!(
                "{}probably full/mixed anisotropic refinement. {}",
                prefix, BEQ_NOT_REPRODUCED
            ))
        } else {
            Verdict::accepted(format!("{}probably full B-factors", prefix), Transform::None)
        }
    }

    fn possible_b_type(&self, remarks: &str) -> bool {
        self.predicates.b_exception(remarks) && self.predicates.bu_mention(remarks)
    }

    /// REFMAC TLS remarks only need the exception wording.
    fn tls_b_type_hint(&self, refmac: bool, remarks: &str) -> bool {
        if refmac {
            self.predicates.b_exception(remarks)
        } else {
            self.possible_b_type(remarks)
        }
    }
}

/// wwPDB remediation annotations are trusted over REMARK 3 free text.
fn decide_remediation(prefix: &str, program: &str, signals: &RefinementSignals) -> Verdict {
    let remediation_2011 = is_remediation_2011_format(signals.format_vers);
    let year = if remediation_2011 { " 2011" } else { "" };
    match signals.b_type {
        Some(BValueType::Residual) => Verdict::residual_if(
            format!("{}residual B-factors (wwPDB remediation{})", prefix, year),
            program == REFMAC,
        ),
        Some(BValueType::Unverified) => Verdict::rejected(format!(
            "{}B-factor type could not be determined (wwPDB remediation{})",
            prefix, year
        )),
        None if program == REFMAC && remediation_2011 => Verdict::accepted(
            format!("{}full B-factors (wwPDB remediation 2011)", prefix),
            Transform::None,
        ),
        None => Verdict::rejected(format!(
            "{}unexpected B-factor type annotation (wwPDB remediation)",
            prefix
        )),
    }
}
