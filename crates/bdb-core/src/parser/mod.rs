#[cfg(test)]
pub(crate) mod fixtures;
pub mod remarks;
pub mod structure;

pub use remarks::RemarkFieldParser;
pub use structure::{Atom, Chain, Residue, ResidueKind, Structure};

use crate::domain::{BdbError, ParserResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const REMARK: &str = "REMARK";
pub const EXPDTA: &str = "EXPDTA";
pub const ANISOU: &str = "ANISOU";

/// PDB header records grouped by their six-column record name.
///
/// Each stored line starts at column 8, so a `REMARK   3 ...` line is kept as
/// `  3 ...`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataRecords {
    records: BTreeMap<String, Vec<String>>,
}

impl MetadataRecords {
    pub fn from_source(source: &str) -> Self {
        let mut records: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for line in source.lines() {
            let tag = columns(line, 0, 6).trim_end();
            records
                .entry(tag.to_string())
                .or_default()
                .push(columns(line, 7, usize::MAX).to_string());
        }
        debug!("Parsed {} record types", records.len());
        Self { records }
    }

    pub fn lines(&self, tag: &str) -> &[String] {
        self.records.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.records.contains_key(tag)
    }

    pub fn has_anisou(&self) -> bool {
        self.contains(ANISOU)
    }

    pub fn remarks(&self) -> &[String] {
        self.lines(REMARK)
    }

    /// Experiment methods from EXPDTA; several methods are separated by `;`.
    pub fn experiment_methods(&self) -> ParserResult<Vec<String>> {
        let Some(lines) = self.records.get(EXPDTA) else {
            return Err(BdbError::input_validation(
                "INPUT.EXPDTA_MISSING",
                "no EXPDTA records found",
            ));
        };

        // Continuation lines carry their serial number in the first columns.
        let joined = lines
            .iter()
            .map(|line| columns(line, 3, usize::MAX).trim())
            .collect::<Vec<_>>()
            .join(" ");
        let methods: Vec<String> = joined
            .split(';')
            .map(str::trim)
            .filter(|method| !method.is_empty())
            .map(str::to_string)
            .collect();
        debug!("Found {} experiment methods", methods.len());
        Ok(methods)
    }
}

pub fn parse_pdb_records(path: &Path) -> ParserResult<MetadataRecords> {
    info!("Parsing pdb file {}", path.display());
    let source = read_pdb_source(path)?;
    Ok(parse_pdb_source(&source))
}

pub fn parse_pdb_source(source: &str) -> MetadataRecords {
    MetadataRecords::from_source(source)
}

pub fn read_pdb_source(path: &Path) -> ParserResult<String> {
    let bytes = fs::read(path).map_err(|source| {
        BdbError::input_validation(
            "INPUT.PDB_FILE",
            format!("failed to read PDB file '{}': {}", path.display(), source),
        )
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Records before the coordinates and the non-coordinate records after them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderAndTrailer {
    pub header: Vec<String>,
    pub trailer: Vec<String>,
}

pub fn header_and_trailer(path: &Path) -> ParserResult<HeaderAndTrailer> {
    let source = read_pdb_source(path)?;
    Ok(split_header_and_trailer(&source))
}

pub fn split_header_and_trailer(source: &str) -> HeaderAndTrailer {
    let mut split = HeaderAndTrailer::default();
    let mut in_header = true;
    for line in source.lines() {
        if starts_with_any(line, &["MODEL", "ATOM", "HETATM"]) {
            in_header = false;
        }
        let kept = columns(line, 0, LINE_WIDTH).to_string();
        if in_header {
            split.header.push(kept);
        } else if !is_coordinate_section_record(line) {
            split.trailer.push(kept);
        }
    }
    split
}

const LINE_WIDTH: usize = 80;

pub(crate) fn is_coordinate_section_record(line: &str) -> bool {
    if starts_with_any(
        line,
        &["MODEL", "ATOM", "HETATM", "ANISOU", "SIGUIJ", "TER", "ENDMDL"],
    ) {
        return true;
    }
    line.strip_prefix("END")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

fn starts_with_any(line: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| line.starts_with(prefix))
}

/// Character columns `[start, end)` of a fixed-width record, clipped to the line.
pub fn columns(line: &str, start: usize, end: usize) -> &str {
    let byte_at = |column: usize| {
        line.char_indices()
            .nth(column)
            .map(|(index, _)| index)
            .unwrap_or(line.len())
    };
    let start_byte = byte_at(start);
    let end_byte = if end == usize::MAX { line.len() } else { byte_at(end) };
    if start_byte >= end_byte {
        ""
    } else {
        &line[start_byte..end_byte]
    }
}
