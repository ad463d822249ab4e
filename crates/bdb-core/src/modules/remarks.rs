use crate::domain::{ParserResult, RefinementSignals};
use crate::parser::MetadataRecords;
use crate::parser::remarks::{RemarkFieldParser, compile};
use regex::Regex;
use tracing::debug;

const TLS_RESIDUAL_RECORD: &str = "  3   ATOM RECORD CONTAINS RESIDUAL B FACTORS ONLY";
const TLS_SUM_RECORD: &str = "  3   ATOM RECORD CONTAINS SUM OF TLS AND RESIDUAL B FACTORS";

const RESIDUAL_PHRASINGS: &[&str] = &[
    r"RESIDUAL\s+([BU]-?\s*(FACTORS?|VALUES?)\s+)?ONLY",
    r"ATOMIC\s+[BU]-?\s*(FACTORS?|VALUES?)\s+(SHOWN\s+)?ARE\s+RESIDUALS(\s+FROM\s+TLS(\s+REFINEMENT)?)?",
    r"[BU]-?\s*(FACTORS?|VALUES?)\s+ARE\s+RESIDUAL\s+[BU]-?\s*(FACTORS?|VALUES?),?(\s+\(?WHICH\s+DO\s+NOT\s+INCLUDE\s+THE\s+CONTRIBUTION\s+FROM\s+THE\s+TLS\s+PARAMETERS\)?)?.?(\s+USE\s+TLSANL(\s+\(?\s*DISTRIBUTED\s+WITH\s+CCP4\)?)?\s+TO\s+OBTAIN\s+THE\s+(FULL\s+)?[BU]-?\s*(FACTORS?|VALUES?))?",
];

const SUM_PHRASINGS: &[&str] = &[
    r"SUM\s+OF\s+TLS\s+AND\s+RESIDUAL\s+[BU]-?\s*(FACTORS?|VALUES?)",
    r"[BU]-?\s*(FACTORS?|VALUES?)\s*:?\s+WITH\s+TLS\s+ADDED",
    r"(GLOBAL\s+)?[BU]-?\s*(FACTORS?|VALUES?),?\s*(CONTAINING\s+)?RESIDUALS?\s+(AND|\+)\s+TLS\s+COMPONENTS?(HAVE\s+BEEN\s+DEPOSITED)?",
    r"([BU]-?\s*(FACTORS?|VALUES?)\s+CORRESPOND\s+TO\s+(THE\s+)?OVERALL?[BU]-?\s*(FACTORS?|VALUES?)\s+EQUAL\s+TO\s+THE\s+)?RESIDUALS?\s+PLUS\s+(THE\s+)?TLS(\s+COMPONENT)?",
    r"[BU]-?\s*(FACTORS?|VALUES?)\s*CONTAINS?\s+(BOTH\s+)?TLS\s+AND\s+RESIDUALS?\s+COMPONENTS?.?",
    r"(?x)
        (
            (ANISOTROPIC\s+)?
            [BU]-?\s*(FACTORS?|VALUES?)\s+
            (THAT\s+RESULT\s+FROM\s+)?
        )?
        (THE\s+)?
        COMBINATION\s+
        (OF\s+)?(THE\s+)?
        TLS\s+COMPONENTS?\s+
        (WITH\s+)?(THE\s+)?
        (RESIDUAL\s+)?
        (INDIVIDUAL\s+)?
        [BU]-?\s*(FACTORS?|VALUES?)\s*.?\s*",
];

const MEAN_SQUARE_PATTERN: &str = r"MEAN-SQUARE AMPLITUDE OF ATOMIC VIBRATION|U\*\*2|UISO";
const U_QUANTITY_PATTERN: &str =
    r"THE\s+QUANTITY\s+PRESENTED\s+IN\s+THE\s+TEMPERATURE\s+FACTOR\s+FIELD\s+IS\s+U\.";
const B_OR_U_PATTERN: &str = r"[BU]-?\s*(FACTORS?|VALUES?)";
const SUM_WORD_PATTERN: &str = r"\s+SUM\s+";
const RESIDUAL_WORD_PATTERN: &str = r"RESIDUALS?(\s+)";
const RESIDUAL_NOT_FOLLOWED_BY: &str = r"^\s+(FEATURES?|ELECTRON|DENSITY)";
const RESIDUAL_NOT_PRECEDED_BY: &str = "MAXIMUM LIKELIHOOD";

/// Independent boolean predicates over REMARK 3 text.
#[derive(Debug, Clone)]
pub struct RemarkPredicates {
    residual_phrasings: Vec<Regex>,
    sum_phrasings: Vec<Regex>,
    mean_square: Regex,
    u_quantity: Regex,
    b_or_u: Regex,
    sum_word: Regex,
    residual_word: Regex,
    residual_context: Regex,
}

impl RemarkPredicates {
    pub fn new() -> ParserResult<Self> {
        Ok(Self {
            residual_phrasings: compile_all(RESIDUAL_PHRASINGS)?,
            sum_phrasings: compile_all(SUM_PHRASINGS)?,
            mean_square: compile(MEAN_SQUARE_PATTERN)?,
            u_quantity: compile(U_QUANTITY_PATTERN)?,
            b_or_u: compile(B_OR_U_PATTERN)?,
            sum_word: compile(SUM_WORD_PATTERN)?,
            residual_word: compile(RESIDUAL_WORD_PATTERN)?,
            residual_context: compile(RESIDUAL_NOT_FOLLOWED_BY)?,
        })
    }

    /// ATOM records hold residual B-factors only.
    pub fn tls_residual(&self, records: &MetadataRecords, remarks: Option<&str>) -> bool {
        has_record_line(records, TLS_RESIDUAL_RECORD)
            || remarks.is_some_and(|text| any_match(&self.residual_phrasings, text))
    }

    /// ATOM records hold the sum of TLS and residual B-factors.
    pub fn tls_sum(&self, records: &MetadataRecords, remarks: Option<&str>) -> bool {
        has_record_line(records, TLS_SUM_RECORD)
            || remarks.is_some_and(|text| any_match(&self.sum_phrasings, text))
    }

    pub fn b_msqav(&self, remarks: Option<&str>) -> bool {
        remarks.is_some_and(|text| self.mean_square.is_match(text))
    }

    pub fn u_quantity(&self, remarks: &str) -> bool {
        self.u_quantity.is_match(remarks)
    }

    pub fn bu_mention(&self, remarks: &str) -> bool {
        self.b_or_u.is_match(remarks)
    }

    pub fn tls_mention(&self, remarks: &str) -> bool {
        remarks.contains("TLS")
    }

    /// A ` SUM ` or a RESIDUAL(S) that does not refer to density features.
    pub fn b_exception(&self, remarks: &str) -> bool {
        if self.sum_word.is_match(remarks) {
            return true;
        }
        self.residual_word.captures_iter(remarks).any(|captures| {
            let (Some(word), Some(spacing)) = (captures.get(0), captures.get(1)) else {
                return false;
            };
            let before = &remarks[..word.start()];
            let after = &remarks[spacing.start()..];
            !preceded_by_maximum_likelihood(before) && !self.residual_context.is_match(after)
        })
    }

    /// Textual signals feeding the decision engine.
    pub fn collect_signals(
        &self,
        records: &MetadataRecords,
        fields: &RemarkFieldParser,
    ) -> ParserResult<RefinementSignals> {
        let (format_vers, format_date) = fields.format_version_and_date(records);
        let other_refinement_remarks = fields.other_refinement_remarks(records);
        let remarks = other_refinement_remarks.as_deref();

        let signals = RefinementSignals {
            b_type: fields.b_value_type(records)?,
            b_msqav: self.b_msqav(remarks),
            format_date,
            format_vers,
            has_anisou: records.has_anisou(),
            refprog: fields.refinement_program(records),
            tls_groups: fields.tls_group_count(records),
            tls_residual: self.tls_residual(records, remarks),
            tls_sum: self.tls_sum(records, remarks),
            other_refinement_remarks,
        };
        debug!(
            "Refinement signals: tls_groups={:?} tls_residual={} tls_sum={} b_msqav={} has_anisou={}",
            signals.tls_groups, signals.tls_residual, signals.tls_sum, signals.b_msqav, signals.has_anisou
        );
        Ok(signals)
    }
}

fn compile_all(patterns: &[&str]) -> ParserResult<Vec<Regex>> {
    patterns.iter().map(|pattern| compile(pattern)).collect()
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(text))
}

fn has_record_line(records: &MetadataRecords, prefix: &str) -> bool {
    records.remarks().iter().any(|line| line.starts_with(prefix))
}

fn preceded_by_maximum_likelihood(before: &str) -> bool {
    let mut chars = before.chars();
    match chars.next_back() {
        Some(last) if last.is_whitespace() => chars.as_str().ends_with(RESIDUAL_NOT_PRECEDED_BY),
        _ => false,
    }
}
