use crate::domain::ComputeResult;
use std::path::PathBuf;

/// Input and output coordinate files of one deconvolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeconvolutionRequest {
    pub xyzin: PathBuf,
    pub xyzout: PathBuf,
}

impl DeconvolutionRequest {
    pub fn new(xyzin: impl Into<PathBuf>, xyzout: impl Into<PathBuf>) -> Self {
        Self {
            xyzin: xyzin.into(),
            xyzout: xyzout.into(),
        }
    }
}

/// Captured result of a finished deconvolution process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeconvolutionRun {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Turns residual B-factors plus TLS descriptions into full B-factors.
pub trait ResidualDeconvolver {
    fn deconvolve(&self, request: &DeconvolutionRequest) -> ComputeResult<DeconvolutionRun>;
}
