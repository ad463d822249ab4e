//! CCP4 TLSANL: adds the TLS contribution to residual B-factors.
//!
//! See <http://www.ccp4.ac.uk/html/tlsanl.html>. ATOM and HETATM records are
//! expected to be sorted on chain and residue number so that the TLS ranges
//! can be interpreted.

use crate::common::config::TlsanlConfig;
use crate::common::constants::{TLSANL_KEYWORDED_INPUT, TLSANL_MIN_OUTPUT_BYTES};
use crate::domain::{BdbError, BdbResult, ComputeResult, ParserResult, SkttlsSummary};
use crate::modules::traits::{DeconvolutionRequest, DeconvolutionRun, ResidualDeconvolver};
use crate::parser::remarks::compile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, error, info};

const INVALID_ARGUMENT: &str = "and_an_invalid_argument";

const SKTTLS_TOTAL: &str = r"^#  Total number of bonds between residues:\s*(\d+)";
const SKTTLS_95TH: &str = r"^#  Number of bonds beyond 95th percentile for any residual:\s*(\d+)";
const SKTTLS_99TH: &str = r"^#  Number of bonds beyond 99th percentile for any residual:\s*(\d+)";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TlsanlFailure {
    #[error("TLSANL problem (exit code: {0})")]
    ExitCode(i32),
    #[error("TLSANL problem")]
    OutputTooSmall { bytes: u64 },
    #[error("TLSANL problem")]
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeconvolutionReport {
    Completed(SkttlsSummary),
    Failed(TlsanlFailure),
}

/// Runs the TLSANL executable as a blocking subprocess.
#[derive(Debug, Clone)]
pub struct TlsanlRunner {
    executable: PathBuf,
}

impl TlsanlRunner {
    pub fn new(config: &TlsanlConfig) -> Self {
        Self {
            executable: config.executable.clone(),
        }
    }
}

impl ResidualDeconvolver for TlsanlRunner {
    fn deconvolve(&self, request: &DeconvolutionRequest) -> ComputeResult<DeconvolutionRun> {
        info!("Preparing TLSANL run...");
        let mut child = Command::new(&self.executable)
            .arg("XYZIN")
            .arg(&request.xyzin)
            .arg("XYZOUT")
            .arg(&request.xyzout)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                BdbError::computation(
                    "RUN.TLSANL_SPAWN",
                    format!("failed to start '{}': {}", self.executable.display(), source),
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(TLSANL_KEYWORDED_INPUT.as_bytes())
                .map_err(|source| {
                    BdbError::computation(
                        "RUN.TLSANL_STDIN",
                        format!("failed to pass keyworded input to TLSANL: {}", source),
                    )
                })?;
        }

        let output = child.wait_with_output().map_err(|source| {
            BdbError::computation("RUN.TLSANL_WAIT", format!("TLSANL did not finish: {}", source))
        })?;
        Ok(DeconvolutionRun {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs the deconvolver, keeps its output next to the entry and checks the
/// three failure signals in order: exit code, output size and stderr.
pub fn run_deconvolution(
    deconvolver: &dyn ResidualDeconvolver,
    request: &DeconvolutionRequest,
    log_dir: &Path,
    config: &TlsanlConfig,
) -> ComputeResult<DeconvolutionReport> {
    let run = deconvolver.deconvolve(request)?;
    let log_path = log_dir.join(&config.log_name);
    let err_path = log_dir.join(&config.err_name);
    for (path, content) in [(&log_path, &run.stdout), (&err_path, &run.stderr)] {
        if let Err(source) = fs::write(path, content) {
            error!("failed to write '{}': {}", path.display(), source);
        }
    }

    let failure = if run.exit_code != Some(0) {
        Some(TlsanlFailure::ExitCode(run.exit_code.unwrap_or(-1)))
    } else {
        let bytes = fs::metadata(&request.xyzout).map_or(0, |metadata| metadata.len());
        if bytes <= TLSANL_MIN_OUTPUT_BYTES {
            Some(TlsanlFailure::OutputTooSmall { bytes })
        } else if !run.stderr.is_empty() {
            Some(TlsanlFailure::Stderr)
        } else {
            None
        }
    };

    if let Some(failure) = failure {
        error!("{}", failure);
        debug!("TLSANL failure details: {:?}", failure);
        return Ok(DeconvolutionReport::Failed(failure));
    }
    info!("TLSANL ran without problems.");
    Ok(DeconvolutionReport::Completed(parse_skttls_summary(&run.stdout)?))
}

/// Skttls bond statistics from a TLSANL log.
pub fn parse_skttls_summary(log: &str) -> ParserResult<SkttlsSummary> {
    let total = compile(SKTTLS_TOTAL)?;
    let beyond_95th = compile(SKTTLS_95TH)?;
    let beyond_99th = compile(SKTTLS_99TH)?;

    let mut summary = SkttlsSummary::default();
    for line in log.lines().map(str::trim) {
        let count = |pattern: &regex::Regex| {
            pattern
                .captures(line)
                .and_then(|captures| captures.get(1))
                .and_then(|number| number.as_str().parse::<u32>().ok())
        };
        if let Some(value) = count(&total) {
            summary.skttls_tot = Some(value);
        }
        if let Some(value) = count(&beyond_95th) {
            summary.skttls_95th = Some(value);
        }
        if let Some(value) = count(&beyond_99th) {
            summary.skttls_99th = Some(value);
        }
    }
    Ok(summary)
}

/// CCP4 programs only take interactive input, so TLSANL is called with an
/// invalid argument: any exit status means it is installed.
pub fn check_dependencies(config: &TlsanlConfig) -> BdbResult<()> {
    let name = config.executable.display();
    match Command::new(&config.executable)
        .arg(INVALID_ARGUMENT)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => {
            debug!("{} set up properly", name);
            Ok(())
        }
        Err(source) => {
            error!(
                "{} could not be executed. Install {} and set up the CCP4 environment properly.",
                name, name
            );
            Err(BdbError::io_system(
                "IO.TLSANL_MISSING",
                format!("{} could not be executed: {}", name, source),
            ))
        }
    }
}
