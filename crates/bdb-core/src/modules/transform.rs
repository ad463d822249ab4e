//! Writers for the `.bdb` coordinate file.

use crate::common::constants::EIGHT_PI_SQUARED;
use crate::domain::{BdbError, BdbResult, ComputeResult};
use crate::parser::{columns, header_and_trailer, is_coordinate_section_record, read_pdb_source};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const B_FACTOR_START: usize = 60;
const B_FACTOR_END: usize = 66;
const END_RECORD: &str = "END";

/// The B-factors are already full isotropic B-factors.
pub fn copy_entry(pdb_file: &Path, xyzout: &Path) -> BdbResult<()> {
    fs::copy(pdb_file, xyzout).map_err(|source| {
        BdbError::io_system(
            "IO.BDB_WRITE",
            format!(
                "failed to copy '{}' to '{}': {}",
                pdb_file.display(),
                xyzout.display(),
                source
            ),
        )
    })?;
    debug!("Copied {} to {}", pdb_file.display(), xyzout.display());
    Ok(())
}

/// Rewrites the coordinates of `pdb_file` with B = 8π² U and keeps its header
/// and trailer.
pub fn write_multiplied_8pi2(pdb_file: &Path, xyzout: &Path) -> BdbResult<()> {
    info!("Calculating B-factors from Uiso values...");
    let source = read_pdb_source(pdb_file)?;
    write_text(xyzout, &multiply_b_factors(&source)?)?;
    transfer_header_and_trailer(pdb_file, xyzout)
}

/// Coordinate section of `source` followed by END, with every ATOM and HETATM
/// temperature factor multiplied by 8π².
pub fn multiply_b_factors(source: &str) -> ComputeResult<String> {
    let mut output = String::new();
    for (index, line) in source.lines().enumerate() {
        if !is_coordinate_section_record(line) || is_end_record(line) {
            continue;
        }
        if line.starts_with("ATOM") || line.starts_with("HETATM") {
            output.push_str(&multiply_line(line, index + 1)?);
        } else {
            output.push_str(line);
        }
        output.push('\n');
    }
    output.push_str(END_RECORD);
    output.push('\n');
    Ok(output)
}

fn multiply_line(line: &str, line_number: usize) -> ComputeResult<String> {
    let field = columns(line, B_FACTOR_START, B_FACTOR_END).trim();
    if field.is_empty() {
        return Ok(line.to_string());
    }
    let u = field.parse::<f64>().map_err(|_| {
        BdbError::input_validation(
            "INPUT.STRUCTURE_RECORD",
            format!("line {}: malformed temperature factor '{}'", line_number, field),
        )
    })?;
    let b = format!("{:6.2}", EIGHT_PI_SQUARED * u);
    if b.len() > B_FACTOR_END - B_FACTOR_START {
        return Err(BdbError::computation(
            "RUN.B_FACTOR_WIDTH",
            format!("line {}: B-factor {} does not fit the PDB format", line_number, b.trim()),
        ));
    }

    let head = columns(line, 0, B_FACTOR_START);
    let tail = columns(line, B_FACTOR_END, usize::MAX);
    Ok(format!("{:<width$}{}{}", head, b, tail, width = B_FACTOR_START))
}

fn is_end_record(line: &str) -> bool {
    line.strip_prefix(END_RECORD)
        .is_some_and(|rest| rest.trim().is_empty())
}

/// Surrounds the coordinates in `xyzout` with the header and trailer of
/// `pdb_file`. An END record in `xyzout` is moved to the very end.
pub fn transfer_header_and_trailer(pdb_file: &Path, xyzout: &Path) -> BdbResult<()> {
    let split = header_and_trailer(pdb_file)?;
    let coordinates = read_pdb_source(xyzout)?;

    let mut end = END_RECORD.to_string();
    let mut records = split.header;
    for line in coordinates.lines() {
        if is_end_record(line) {
            end = line.to_string();
        } else {
            records.push(line.to_string());
        }
    }
    records.extend(split.trailer);
    records.push(end);

    let mut content = records.join("\n");
    content.push('\n');
    let staged = staged_path(xyzout);
    write_text(&staged, &content)?;
    fs::rename(&staged, xyzout).map_err(|source| {
        BdbError::io_system(
            "IO.BDB_WRITE",
            format!("failed to replace '{}': {}", xyzout.display(), source),
        )
    })
}

fn staged_path(xyzout: &Path) -> PathBuf {
    let mut name = xyzout.as_os_str().to_owned();
    name.push("2");
    PathBuf::from(name)
}

fn write_text(path: &Path, content: &str) -> BdbResult<()> {
    fs::write(path, content).map_err(|source| {
        BdbError::io_system(
            "IO.BDB_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{copy_entry, multiply_b_factors, write_multiplied_8pi2};
    use crate::domain::BdbErrorCategory;
    use crate::parser::columns;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE: &str = "\
HEADER    HYDROLASE                               01-JAN-01   1ABC
REMARK   3   OTHER REFINEMENT REMARKS: MEAN-SQUARE AMPLITUDE OF ATOMIC VIBRATION
ATOM      1  N   MET A   1      11.104  13.207   2.100  1.00  0.25           N
HETATM    2  O   HOH A 101      10.000  10.000  10.000  1.00  0.50           O
TER       3      HOH A 101
CONECT    1    2
MASTER        0    0    0    0    0    0    0    0    2    1    1    0
END
";

    #[test]
    fn b_factors_are_multiplied_in_place() {
        let output = multiply_b_factors(SOURCE).expect("coordinates should multiply");
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(columns(lines[0], 60, 66), " 19.74");
        assert_eq!(columns(lines[1], 60, 66), " 39.48");
        assert_eq!(columns(lines[0], 0, 60), columns(SOURCE.lines().nth(2).unwrap_or(""), 0, 60));
        assert!(lines[0].ends_with("           N"));
        assert_eq!(lines[2], "TER       3      HOH A 101");
        assert_eq!(lines[3], "END");
    }

    #[test]
    fn oversized_b_factors_are_rejected() {
        let source = "ATOM      1  N   MET A   1      11.104  13.207   2.100  1.00999.99           N\n";
        let error = multiply_b_factors(source).expect_err("B-factor should not fit");
        assert_eq!(error.category(), BdbErrorCategory::ComputationError);
    }

    #[test]
    fn multiplied_file_keeps_header_and_trailer() {
        let temp = TempDir::new().expect("temp dir should be created");
        let input = temp.path().join("1abc.pdb");
        let output = temp.path().join("1abc.bdb");
        fs::write(&input, SOURCE).expect("input should be written");

        write_multiplied_8pi2(&input, &output).expect("multiplied file should be written");
        let written = fs::read_to_string(&output).expect("output should exist");
        let lines: Vec<&str> = written.lines().collect();

        assert!(lines[0].starts_with("HEADER"));
        assert!(lines[1].starts_with("REMARK   3"));
        assert!(lines[2].starts_with("ATOM"));
        assert!(lines[3].starts_with("HETATM"));
        assert!(lines[4].starts_with("TER"));
        assert!(lines[5].starts_with("CONECT"));
        assert!(lines[6].starts_with("MASTER"));
        assert_eq!(lines[7], "END");
        assert_eq!(lines.len(), 8);
        assert!(!temp.path().join("1abc.bdb2").exists());
    }

    #[test]
    fn copy_keeps_the_file_unchanged() {
        let temp = TempDir::new().expect("temp dir should be created");
        let input = temp.path().join("1abc.pdb");
        let output = temp.path().join("1abc.bdb");
        fs::write(&input, SOURCE).expect("input should be written");

        copy_entry(&input, &output).expect("copy should succeed");
        assert_eq!(fs::read_to_string(&output).expect("output should exist"), SOURCE);
    }
}
