use crate::domain::ParserResult;
use crate::parser::remarks::compile;
use regex::Regex;

const DELIMITER_PATTERN: &str = r",|&|;|\+|AND|/";

/// A `/` between these program parts belongs to a single program name.
const SLASH_PROTECTED_BEFORE: &[&str] = &["ARP", "SOLVE", "BUSTER", "TOM", "FMLS"];
const SLASH_PROTECTED_AFTER: &[&str] = &["WARP", "RESOLVE", "TNT", "FRODO", "VP"];
const PLUS_PROTECTED_AFTER: &str = "SVN";

#[derive(Debug, Clone)]
pub(super) struct SegmentSplitter {
    delimiters: Regex,
}

impl SegmentSplitter {
    pub(super) fn new() -> ParserResult<Self> {
        Ok(Self {
            delimiters: compile(DELIMITER_PATTERN)?,
        })
    }

    /// Splits an uppercased refinement program field into trimmed, non-empty segments.
    pub(super) fn split(&self, field: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut start = 0;
        for delimiter in self.delimiters.find_iter(field) {
            let before = &field[..delimiter.start()];
            let after = &field[delimiter.end()..];
            if is_protected(delimiter.as_str(), before, after) {
                continue;
            }
            segments.push(&field[start..delimiter.start()]);
            start = delimiter.end();
        }
        segments.push(&field[start..]);

        segments
            .into_iter()
            .map(|segment| segment.trim_matches(' ').to_uppercase())
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

fn is_protected(delimiter: &str, before: &str, after: &str) -> bool {
    match delimiter {
        "+" => after.starts_with(PLUS_PROTECTED_AFTER),
        "/" => {
            SLASH_PROTECTED_BEFORE
                .iter()
                .any(|part| before.ends_with(part))
                || SLASH_PROTECTED_AFTER
                    .iter()
                    .any(|part| after.starts_with(part))
        }
        _ => false,
    }
}
