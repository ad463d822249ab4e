//! Runtime configuration for building one databank entry.
//!
//! The CLI fills these structs from its arguments; library callers can build
//! them directly.

use crate::domain::{BdbError, BdbResult};
use std::path::{Path, PathBuf};

pub const DEFAULT_TLSANL_EXECUTABLE: &str = "tlsanl";
pub const TLSANL_LOG_NAME: &str = "tlsanl.log";
pub const TLSANL_ERR_NAME: &str = "tlsanl.err";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsanlConfig {
    pub executable: PathBuf,
    pub log_name: String,
    pub err_name: String,
}

impl Default for TlsanlConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_TLSANL_EXECUTABLE),
            log_name: TLSANL_LOG_NAME.to_string(),
            err_name: TLSANL_ERR_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryConfig {
    pub bdb_root: PathBuf,
    pub pdb_file: PathBuf,
    pub pdb_id: String,
    pub verbose: bool,
    pub tlsanl: TlsanlConfig,
}

impl EntryConfig {
    pub fn new(
        bdb_root: impl Into<PathBuf>,
        pdb_file: impl Into<PathBuf>,
        pdb_id: impl Into<String>,
    ) -> Self {
        Self {
            bdb_root: bdb_root.into(),
            pdb_file: pdb_file.into(),
            pdb_id: pdb_id.into(),
            verbose: false,
            tlsanl: TlsanlConfig::default(),
        }
    }

    /// Directory holding all artifacts of this entry: `<root>/<id[1..3]>/<id>`.
    pub fn entry_dir(&self) -> BdbResult<PathBuf> {
        entry_dir_for(&self.bdb_root, &self.pdb_id)
    }
}

pub fn is_valid_pdb_id(pdb_id: &str) -> bool {
    pdb_id.len() == 4 && pdb_id.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn validate_pdb_id(pdb_id: &str) -> BdbResult<()> {
    if is_valid_pdb_id(pdb_id) {
        Ok(())
    } else {
        Err(BdbError::input_validation(
            "INPUT.PDB_ID",
            format!("not a valid PDB ID: '{}'", pdb_id),
        ))
    }
}

pub fn entry_dir_for(bdb_root: &Path, pdb_id: &str) -> BdbResult<PathBuf> {
    validate_pdb_id(pdb_id)?;
    Ok(bdb_root.join(&pdb_id[1..3]).join(pdb_id))
}

#[cfg(test)]
mod tests {
    use super::{EntryConfig, entry_dir_for, is_valid_pdb_id};
    use crate::domain::BdbErrorCategory;
    use std::path::Path;

    #[test]
    fn pdb_ids_are_four_alphanumerics() {
        assert!(is_valid_pdb_id("1abc"));
        assert!(is_valid_pdb_id("9XYZ"));
        assert!(!is_valid_pdb_id("1ab"));
        assert!(!is_valid_pdb_id("1abcd"));
        assert!(!is_valid_pdb_id("1a-c"));
    }

    #[test]
    fn entry_dir_uses_middle_characters() {
        let dir = entry_dir_for(Path::new("/data/bdb"), "1abc").expect("valid id should map");
        assert_eq!(dir, Path::new("/data/bdb/ab/1abc"));

        let config = EntryConfig::new("/data/bdb", "1crn.pdb", "1crn");
        assert_eq!(
            config.entry_dir().expect("valid id should map"),
            Path::new("/data/bdb/cr/1crn")
        );
    }

    #[test]
    fn invalid_id_is_an_input_error() {
        let error = entry_dir_for(Path::new("/data"), "x").expect_err("short id should fail");
        assert_eq!(error.category(), BdbErrorCategory::InputValidationError);
        assert_eq!(error.code(), "INPUT.PDB_ID");
    }
}
