use crate::domain::{BdbEntry, BdbError, BdbResult};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const JSON_INDENT: &[u8] = b"    ";

pub fn whynot_content(pdb_id: &str, reason: &str) -> String {
    format!("COMMENT: {}\nBDB,{}\n", reason, pdb_id)
}

/// Writes `<dir>/<pdb_id>.whynot`.
pub fn write_whynot(dir: &Path, pdb_id: &str, reason: &str) -> BdbResult<PathBuf> {
    warn!("Writing WHY NOT entry.");
    let path = dir.join(format!("{}.whynot", pdb_id));
    fs::write(&path, whynot_content(pdb_id, reason)).map_err(|source| {
        BdbError::io_system(
            "IO.WHYNOT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })?;
    Ok(path)
}

/// Pretty JSON with sorted keys and four-space indentation.
pub fn to_sorted_json<T: Serialize>(value: &T) -> BdbResult<String> {
    let value = serde_json::to_value(value).map_err(|source| {
        BdbError::internal("INTERNAL.JSON", format!("failed to serialize entry: {}", source))
    })?;

    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(JSON_INDENT));
    value.serialize(&mut serializer).map_err(|source| {
        BdbError::internal("INTERNAL.JSON", format!("failed to format entry: {}", source))
    })?;
    String::from_utf8(buffer)
        .map_err(|source| BdbError::internal("INTERNAL.JSON", source.to_string()))
}

/// Writes `<dir>/<pdb_id>.json`.
pub fn write_entry_json(dir: &Path, entry: &BdbEntry) -> BdbResult<PathBuf> {
    let path = dir.join(format!("{}.json", entry.pdb_id));
    let mut content = to_sorted_json(entry)?;
    content.push('\n');
    fs::write(&path, content).map_err(|source| {
        BdbError::io_system(
            "IO.JSON_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{to_sorted_json, whynot_content, write_entry_json, write_whynot};
    use crate::domain::{BdbEntry, BdbErrorCategory};
    use std::fs;
    use tempfile::TempDir;

    fn unusable_entry() -> BdbEntry {
        BdbEntry {
            pdb_id: "1abc".to_string(),
            expdta: vec!["SOLUTION NMR".to_string()],
            expdta_useful: false,
            refinement: None,
        }
    }

    #[test]
    fn whynot_has_comment_and_databank_lines() {
        assert_eq!(
            whynot_content("1abc", "Experimental method: SOLUTION NMR"),
            "COMMENT: Experimental method: SOLUTION NMR\nBDB,1abc\n"
        );

        let temp = TempDir::new().expect("temp dir should be created");
        let path = write_whynot(temp.path(), "1abc", "TLSANL problem").expect("whynot should be written");
        assert_eq!(path, temp.path().join("1abc.whynot"));
        assert_eq!(
            fs::read_to_string(path).expect("whynot should be readable"),
            "COMMENT: TLSANL problem\nBDB,1abc\n"
        );
    }

    #[test]
    fn whynot_into_missing_directory_is_an_io_error() {
        let temp = TempDir::new().expect("temp dir should be created");
        let error = write_whynot(&temp.path().join("missing"), "1abc", "reason")
            .expect_err("missing directory should fail");
        assert_eq!(error.category(), BdbErrorCategory::IoSystemError);
        assert_eq!(error.code(), "IO.WHYNOT_WRITE");
    }

    #[test]
    fn json_keys_are_sorted_with_four_space_indent() {
        let json = to_sorted_json(&unusable_entry()).expect("entry should serialize");
        assert_eq!(
            json,
            "{\n    \"expdta\": [\n        \"SOLUTION NMR\"\n    ],\n    \"expdta_useful\": false,\n    \"pdb_id\": \"1abc\"\n}"
        );
    }

    #[test]
    fn entry_json_is_written_next_to_the_entry() {
        let temp = TempDir::new().expect("temp dir should be created");
        let path = write_entry_json(temp.path(), &unusable_entry()).expect("json should be written");
        assert_eq!(path, temp.path().join("1abc.json"));
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).expect("json should be readable"))
                .expect("json should parse");
        assert_eq!(value["expdta_useful"], serde_json::Value::Bool(false));
    }
}
