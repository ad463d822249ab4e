//! Experiment method gate.
//!
//! Only single-method X-ray structures are processed. Files with any other
//! method can be collected in an [`UnsupportedMethodLedger`] that the caller
//! owns and merges across a batch.

use crate::domain::{BdbError, BdbResult};
use crate::parser::MetadataRecords;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

pub const SUPPORTED_METHOD: &str = "X-RAY DIFFRACTION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentCheck {
    pub methods: Vec<String>,
    pub useful: bool,
    /// WHY NOT reason when the method is not useful.
    pub reason: Option<String>,
}

impl ExperimentCheck {
    fn rejected(methods: Vec<String>, reason: String) -> Self {
        Self {
            methods,
            useful: false,
            reason: Some(reason),
        }
    }
}

pub fn check_experiment_methods(
    records: &MetadataRecords,
    ledger: Option<&mut UnsupportedMethodLedger>,
) -> ExperimentCheck {
    let methods = match records.experiment_methods() {
        Ok(methods) if !methods.is_empty() => methods,
        Ok(_) | Err(_) => {
            let reason = "Experimental method: EXPDTA parse error".to_string();
            error!("{}.", reason);
            return ExperimentCheck::rejected(Vec::new(), reason);
        }
    };

    if methods.len() > 1 {
        let reason = format!("Experimental method: multiple ({})", methods.join(" and "));
        warn!("{}.", reason);
        if let Some(ledger) = ledger {
            ledger.record(&methods);
        }
        return ExperimentCheck::rejected(methods, reason);
    }

    info!("Experimental method: {}.", methods[0]);
    if methods[0] == SUPPORTED_METHOD {
        return ExperimentCheck {
            methods,
            useful: true,
            reason: None,
        };
    }

    let reason = format!("Experimental method: {}", methods[0]);
    warn!("{} cannot be included in the bdb.", reason);
    if let Some(ledger) = ledger {
        ledger.record(&methods);
    }
    ExperimentCheck::rejected(methods, reason)
}

/// Unique method strings of unsupported files, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnsupportedMethodLedger {
    entries: Vec<String>,
}

impl UnsupportedMethodLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&mut self, methods: &[String]) {
        self.insert(methods.join(" and "));
    }

    pub fn merge(&mut self, other: &UnsupportedMethodLedger) {
        for entry in &other.entries {
            self.insert(entry.clone());
        }
    }

    fn insert(&mut self, entry: String) {
        if !entry.is_empty() && !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    /// Reads a ledger written by [`Self::persist`]; a missing file is empty.
    pub fn load(path: &Path) -> BdbResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| {
            BdbError::io_system(
                "IO.LEDGER_READ",
                format!("failed to read '{}': {}", path.display(), source),
            )
        })?;
        let mut ledger = Self::default();
        for line in content.lines() {
            ledger.insert(line.trim().to_string());
        }
        Ok(ledger)
    }

    pub fn persist(&self, path: &Path) -> BdbResult<()> {
        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(entry);
            content.push('\n');
        }
        fs::write(path, content).map_err(|source| {
            BdbError::io_system(
                "IO.LEDGER_WRITE",
                format!("failed to write '{}': {}", path.display(), source),
            )
        })
    }
}
