use super::MetadataRecords;
use crate::domain::{BValueType, BdbError, ParserResult, TlsSelection};
use regex::Regex;
use tracing::{debug, error};

const B_VALUE_TYPE_PREFIX: &str = "  3   B VALUE TYPE : ";
const PROGRAM_PREFIX: &str = "  3   PROGRAM     : ";
const OTHER_REMARKS_PREFIX: &str = "  3  OTHER REFINEMENT REMARKS: ";
const REMARK_3_PREFIX: &str = "  3";

const FORMAT_PATTERN: &str =
    r"^  4 [0-9A-Z]{4} COMPLIES WITH FORMAT V. (?P<version>[0-9.]+), (?P<date>[0-9]{2}-[A-Z]{3}-[0-9]{2})";
const TLS_GROUPS_PATTERN: &str = r"^  3   NUMBER OF TLS GROUPS  :\s*([0-9]+)\s*$";
const TLS_SELECTION_PATTERN: &str = r"^\s+3\s+RESIDUE\sRANGE\s:\s+(?P<ch_1>[0-9a-zA-Z])\s+(?P<rn_1>-?[0-9]+)(?P<ic_1>[a-zA-Z]?)\s+(?P<ch_2>[0-9a-zA-Z])\s+(?P<rn_2>-?[0-9]+)(?P<ic_2>[a-zA-Z]?)\s*$";

pub(crate) fn compile(pattern: &str) -> ParserResult<Regex> {
    Regex::new(pattern).map_err(|source| {
        BdbError::internal(
            "INTERNAL.REGEX",
            format!("built-in pattern '{}' failed to compile: {}", pattern, source),
        )
    })
}

/// Extracts the REMARK 3 and REMARK 4 fields used by the classifier.
///
/// A file without REMARK records behaves as if every field were absent.
#[derive(Debug, Clone)]
pub struct RemarkFieldParser {
    format: Regex,
    tls_groups: Regex,
    tls_selection: Regex,
}

impl RemarkFieldParser {
    pub fn new() -> ParserResult<Self> {
        Ok(Self {
            format: compile(FORMAT_PATTERN)?,
            tls_groups: compile(TLS_GROUPS_PATTERN)?,
            tls_selection: compile(TLS_SELECTION_PATTERN)?,
        })
    }

    pub fn b_value_type(&self, records: &MetadataRecords) -> ParserResult<Option<BValueType>> {
        for line in records.remarks() {
            let Some(value) = line.strip_prefix(B_VALUE_TYPE_PREFIX) else {
                continue;
            };
            return match value.trim_end() {
                "LIKELY RESIDUAL" => Ok(Some(BValueType::Residual)),
                "UNVERIFIED" => Ok(Some(BValueType::Unverified)),
                other => Err(BdbError::input_validation(
                    "INPUT.B_VALUE_TYPE",
                    format!("unexpected B VALUE TYPE found: {}", other),
                )),
            };
        }
        Ok(None)
    }

    pub fn refinement_program(&self, records: &MetadataRecords) -> Option<String> {
        let line = records
            .remarks()
            .iter()
            .find_map(|line| line.strip_prefix(PROGRAM_PREFIX))?;
        match line.trim_end() {
            "NULL" | "NONE" | "NO REFINEMENT" => None,
            program => Some(program.to_string()),
        }
    }

    /// OTHER REFINEMENT REMARKS joined with the REMARK 3 lines that follow it.
    pub fn other_refinement_remarks(&self, records: &MetadataRecords) -> Option<String> {
        let remarks = records.remarks();
        let start = remarks.iter().position(|line| {
            line.strip_prefix(OTHER_REMARKS_PREFIX)
                .is_some_and(|rest| !rest.starts_with("NULL") && !rest.starts_with("NONE"))
        })?;

        let mut text = super::columns(&remarks[start], 31, usize::MAX)
            .trim_end()
            .to_string();
        for line in remarks[start + 1..]
            .iter()
            .take_while(|line| line.starts_with(REMARK_3_PREFIX))
        {
            text.push(' ');
            text.push_str(super::columns(line, 5, usize::MAX).trim_end());
        }
        Some(text)
    }

    pub fn format_version_and_date(&self, records: &MetadataRecords) -> (Option<f64>, Option<String>) {
        for line in records.remarks() {
            let Some(captures) = self.format.captures(line) else {
                continue;
            };
            let date = captures.name("date").map(|m| m.as_str().to_string());
            let version = captures.name("version").map(|m| m.as_str()).and_then(|raw| {
                raw.parse::<f64>()
                    .inspect_err(|_| {
                        error!(
                            "Unexpected value encountered for REMARK 4 FORMAT VERSION: {}. None returned",
                            raw
                        )
                    })
                    .ok()
            });
            return (version, date);
        }
        (None, None)
    }

    pub fn tls_group_count(&self, records: &MetadataRecords) -> Option<u32> {
        records.remarks().iter().find_map(|line| {
            let captures = self.tls_groups.captures(line)?;
            captures.get(1)?.as_str().parse::<u32>().ok()
        })
    }

    pub fn tls_selections(&self, records: &MetadataRecords) -> Vec<TlsSelection> {
        let selections: Vec<TlsSelection> = records
            .remarks()
            .iter()
            .filter_map(|line| {
                let captures = self.tls_selection.captures(line)?;
                let text = |name: &str| captures.name(name).map(|m| m.as_str()).unwrap_or("");
                let icode = |name: &str| text(name).chars().next();
                Some(TlsSelection {
                    chain_1: text("ch_1").to_string(),
                    num_1: text("rn_1").parse().ok()?,
                    icode_1: icode("ic_1"),
                    chain_2: text("ch_2").to_string(),
                    num_2: text("rn_2").parse().ok()?,
                    icode_2: icode("ic_2"),
                })
            })
            .collect();
        debug!("Found {} TLS residue range selections", selections.len());
        selections
    }
}

#[cfg(test)]
mod tests {
    use super::RemarkFieldParser;
    use crate::domain::{BValueType, BdbErrorCategory, TlsSelection};
    use crate::parser::MetadataRecords;

    fn parser() -> RemarkFieldParser {
        RemarkFieldParser::new().expect("built-in patterns should compile")
    }

    #[test]
    fn b_value_type_maps_known_values() {
        let records = MetadataRecords::from_source("REMARK   3   B VALUE TYPE : LIKELY RESIDUAL  \n");
        assert_eq!(
            parser().b_value_type(&records).expect("value should parse"),
            Some(BValueType::Residual)
        );

        let records = MetadataRecords::from_source("REMARK   3   B VALUE TYPE : UNVERIFIED\n");
        assert_eq!(
            parser().b_value_type(&records).expect("value should parse"),
            Some(BValueType::Unverified)
        );

        let records = MetadataRecords::from_source("REMARK   3   PROGRAM     : REFMAC\n");
        assert_eq!(parser().b_value_type(&records).expect("absent is fine"), None);
    }

    #[test]
    fn unexpected_b_value_type_is_rejected() {
        let records = MetadataRecords::from_source("REMARK   3   B VALUE TYPE : FULL\n");
        let error = parser()
            .b_value_type(&records)
            .expect_err("unknown value should fail");
        assert_eq!(error.category(), BdbErrorCategory::InputValidationError);
        assert_eq!(error.code(), "INPUT.B_VALUE_TYPE");
    }

    #[test]
    fn refinement_program_drops_sentinels() {
        let records = MetadataRecords::from_source("REMARK   3   PROGRAM     : REFMAC 5.8.0073   \n");
        assert_eq!(
            parser().refinement_program(&records).as_deref(),
            Some("REFMAC 5.8.0073")
        );

        for sentinel in ["NULL", "NONE", "NO REFINEMENT"] {
            let records =
                MetadataRecords::from_source(&format!("REMARK   3   PROGRAM     : {}\n", sentinel));
            assert_eq!(parser().refinement_program(&records), None);
        }
        assert_eq!(parser().refinement_program(&MetadataRecords::default()), None);
    }

    #[test]
    fn other_refinement_remarks_join_following_lines() {
        let source = "\
REMARK   3  OTHER REFINEMENT REMARKS: HYDROGENS HAVE BEEN ADDED IN THE
REMARK   3  RIDING POSITIONS. ATOM RECORD CONTAINS RESIDUAL B FACTORS ONLY
REMARK   4
REMARK   4 1ABC COMPLIES WITH FORMAT V. 3.30, 13-JUL-11
";
        let records = MetadataRecords::from_source(source);
        assert_eq!(
            parser().other_refinement_remarks(&records).as_deref(),
            Some(
                "HYDROGENS HAVE BEEN ADDED IN THE RIDING POSITIONS. ATOM RECORD CONTAINS RESIDUAL B FACTORS ONLY"
            )
        );

        let records = MetadataRecords::from_source("REMARK   3  OTHER REFINEMENT REMARKS: NULL\n");
        assert_eq!(parser().other_refinement_remarks(&records), None);
    }

    #[test]
    fn format_version_and_date_are_read_from_remark_4() {
        let records = MetadataRecords::from_source(
            "REMARK   4 1ABC COMPLIES WITH FORMAT V. 3.30, 13-JUL-11\n",
        );
        let (version, date) = parser().format_version_and_date(&records);
        assert_eq!(version, Some(3.30));
        assert_eq!(date.as_deref(), Some("13-JUL-11"));

        let (version, date) = parser().format_version_and_date(&MetadataRecords::default());
        assert_eq!(version, None);
        assert_eq!(date, None);
    }

    #[test]
    fn tls_group_count_and_selections_are_parsed() {
        let source = "\
REMARK   3   NUMBER OF TLS GROUPS  : 2
REMARK   3    RESIDUE RANGE :   A     1        A    50
REMARK   3    RESIDUE RANGE :   B   -3A        B   120
";
        let records = MetadataRecords::from_source(source);
        assert_eq!(parser().tls_group_count(&records), Some(2));
        assert_eq!(
            parser().tls_selections(&records),
            vec![
                TlsSelection {
                    chain_1: "A".to_string(),
                    num_1: 1,
                    icode_1: None,
                    chain_2: "A".to_string(),
                    num_2: 50,
                    icode_2: None,
                },
                TlsSelection {
                    chain_1: "B".to_string(),
                    num_1: -3,
                    icode_1: Some('A'),
                    chain_2: "B".to_string(),
                    num_2: 120,
                    icode_2: None,
                },
            ]
        );

        let records = MetadataRecords::from_source("REMARK   3   NUMBER OF TLS GROUPS  : NULL\n");
        assert_eq!(parser().tls_group_count(&records), None);
    }
}
