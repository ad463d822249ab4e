//! Builds one databank entry: `<root>/<id[1..3]>/<id>/<id>.(bdb|whynot|json)`.

use crate::common::config::EntryConfig;
use crate::domain::{
    BGroupResult, BdbEntry, BdbError, BdbErrorCategory, BdbResult, ProgramMention, RefinementRecord,
    RefinementSignals, SkttlsSummary, Transform, VerificationResult,
};
use crate::modules::bgroup::classify_structure;
use crate::modules::decision::{RefinementDecisionEngine, RefinementOutcome};
use crate::modules::expdta::{UnsupportedMethodLedger, check_experiment_methods};
use crate::modules::serialization::{write_entry_json, write_whynot};
use crate::modules::tlsanl::{DeconvolutionReport, run_deconvolution};
use crate::modules::traits::{DeconvolutionRequest, ResidualDeconvolver};
use crate::modules::transform::{copy_entry, write_multiplied_8pi2};
use crate::modules::verification::{check_tls_ranges, report, verify_displacements};
use crate::parser::{
    MetadataRecords, RemarkFieldParser, Structure, parse_pdb_source, read_pdb_source,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

const UNEXPECTED_STATUS: &str = "Unexpected bdb status";

/// External pieces of the pipeline that callers can replace.
pub struct EntryCollaborators<'a> {
    pub deconvolver: &'a dyn ResidualDeconvolver,
    pub ledger: Option<&'a mut UnsupportedMethodLedger>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryOutcome {
    pub entry_dir: PathBuf,
    pub entry: BdbEntry,
    /// A `.bdb` file was written.
    pub created_bdb: bool,
    /// Reason written to the WHY NOT file, if any.
    pub whynot: Option<String>,
}

pub fn create_bdb_entry(
    config: &EntryConfig,
    collaborators: EntryCollaborators<'_>,
) -> BdbResult<EntryOutcome> {
    let entry_dir = prepare_entry_dir(config)?;
    debug!("Creating bdb entry...");

    let source = read_pdb_source(&config.pdb_file)?;
    let records = parse_pdb_source(&source);
    let mut pipeline = EntryPipeline {
        config,
        entry_dir,
        whynot: None,
    };

    let expdta = check_experiment_methods(&records, collaborators.ledger);
    if let Some(reason) = &expdta.reason {
        pipeline.reject(reason)?;
    }

    let mut entry = BdbEntry {
        pdb_id: config.pdb_id.clone(),
        expdta: expdta.methods,
        expdta_useful: expdta.useful,
        refinement: None,
    };

    let mut created_bdb = false;
    if entry.expdta_useful {
        let fields = RemarkFieldParser::new()?;
        let engine = RefinementDecisionEngine::new()?;
        let parsed = pipeline.read_input(&source, &records, &fields, &engine)?;
        if let Some((structure, signals)) = parsed {
            let input = RefinementInput {
                records: &records,
                structure: &structure,
                fields: &fields,
                engine: &engine,
            };
            let (record, created) = pipeline.refine(&input, signals, collaborators.deconvolver)?;
            entry.refinement = Some(record);
            created_bdb = created;
        }
    }

    write_entry_json(&pipeline.entry_dir, &entry)?;
    Ok(EntryOutcome {
        entry_dir: pipeline.entry_dir,
        entry,
        created_bdb,
        whynot: pipeline.whynot,
    })
}

pub fn prepare_entry_dir(config: &EntryConfig) -> BdbResult<PathBuf> {
    let entry_dir = config.entry_dir()?;
    fs::create_dir_all(&entry_dir).map_err(|source| {
        BdbError::io_system(
            "IO.ENTRY_DIR",
            format!("failed to create '{}': {}", entry_dir.display(), source),
        )
    })?;
    Ok(entry_dir)
}

struct RefinementInput<'a> {
    records: &'a MetadataRecords,
    structure: &'a Structure,
    fields: &'a RemarkFieldParser,
    engine: &'a RefinementDecisionEngine,
}

struct EntryPipeline<'a> {
    config: &'a EntryConfig,
    entry_dir: PathBuf,
    whynot: Option<String>,
}

impl EntryPipeline<'_> {
    fn reject(&mut self, reason: &str) -> BdbResult<()> {
        write_whynot(&self.entry_dir, &self.config.pdb_id, reason)?;
        self.whynot = Some(reason.to_string());
        Ok(())
    }

    fn xyzout(&self) -> PathBuf {
        self.entry_dir.join(format!("{}.bdb", self.config.pdb_id))
    }

    /// Coordinates and REMARK signals. Malformed input ends the entry with a
    /// WHY NOT instead of an error.
    fn read_input(
        &mut self,
        source: &str,
        records: &MetadataRecords,
        fields: &RemarkFieldParser,
        engine: &RefinementDecisionEngine,
    ) -> BdbResult<Option<(Structure, RefinementSignals)>> {
        debug!("Parsing refinement program...");
        let parsed = Structure::from_source(source).and_then(|structure| {
            let signals = engine.predicates().collect_signals(records, fields)?;
            Ok((structure, signals))
        });
        match parsed {
            Ok(parsed) => Ok(Some(parsed)),
            Err(error) if error.category() == BdbErrorCategory::InputValidationError => {
                error!("{}", error.diagnostic_line());
                self.reject(&format!("Parse error: {}", error.message()))?;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn refine(
        &mut self,
        input: &RefinementInput<'_>,
        signals: RefinementSignals,
        deconvolver: &dyn ResidualDeconvolver,
    ) -> BdbResult<(RefinementRecord, bool)> {
        let structure = input.structure;
        let verification = if signals.has_anisou {
            let verification = verify_displacements(structure);
            report(&verification);
            verification
        } else {
            VerificationResult::without_anisou()
        };

        let outcome = input.engine.decide(&signals, &verification);
        if !outcome.decision.is_includable() {
            self.reject(&outcome.decision.message)?;
        }

        let b_group = classify_structure(structure);
        let mut skttls = SkttlsSummary::default();
        let created = match outcome.decision.transform() {
            Some(Transform::RunTlsDeconvolution) => {
                check_tls_ranges(structure, &input.fields.tls_selections(input.records));
                match self.deconvolve(deconvolver)? {
                    Some(summary) => {
                        skttls = summary;
                        true
                    }
                    None => false,
                }
            }
            Some(Transform::MultiplyBy8Pi2) => {
                let xyzout = self.xyzout();
                self.write_bdb(write_multiplied_8pi2(&self.config.pdb_file, &xyzout))?
            }
            Some(Transform::None) if outcome.assume_iso => {
                let xyzout = self.xyzout();
                self.write_bdb(copy_entry(&self.config.pdb_file, &xyzout))?
            }
            Some(Transform::None) => {
                error!("{}.", UNEXPECTED_STATUS);
                self.reject(UNEXPECTED_STATUS)?;
                false
            }
            None => false,
        };
        if created {
            info!("Created {}", self.xyzout().display());
        }

        Ok((refinement_record(signals, verification, outcome, b_group, skttls), created))
    }

    fn deconvolve(&mut self, deconvolver: &dyn ResidualDeconvolver) -> BdbResult<Option<SkttlsSummary>> {
        let request = DeconvolutionRequest::new(&self.config.pdb_file, self.xyzout());
        match run_deconvolution(deconvolver, &request, &self.entry_dir, &self.config.tlsanl) {
            Ok(DeconvolutionReport::Completed(summary)) => Ok(Some(summary)),
            Ok(DeconvolutionReport::Failed(failure)) => {
                self.reject(&failure.to_string())?;
                Ok(None)
            }
            Err(error) => {
                error!("{}", error.diagnostic_line());
                self.reject("TLSANL problem")?;
                Ok(None)
            }
        }
    }

    /// A failed write leaves the entry without a `.bdb` file.
    fn write_bdb(&mut self, written: BdbResult<()>) -> BdbResult<bool> {
        match written {
            Ok(()) => Ok(true),
            Err(error) => {
                error!("{}", error.diagnostic_line());
                remove_partial(&self.xyzout());
                self.reject(error.message())?;
                Ok(false)
            }
        }
    }
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(source) = fs::remove_file(path) {
            error!("failed to remove '{}': {}", path.display(), source);
        }
    }
}

fn refinement_record(
    signals: RefinementSignals,
    verification: VerificationResult,
    outcome: RefinementOutcome,
    b_group: BGroupResult,
    skttls: SkttlsSummary,
) -> RefinementRecord {
    let mentions = outcome.mentions.as_deref();
    let column = |select: fn(&ProgramMention) -> Option<String>| {
        mentions.map(|mentions| mentions.iter().map(select).collect::<Vec<_>>())
    };
    RefinementRecord {
        ref_prog: column(|mention| mention.raw.clone()),
        prog_inter: column(|mention| mention.interpreted.clone()),
        prog_vers: column(|mention| mention.version.clone()),
        prog_last: outcome.provenance.as_ref().map(|provenance| provenance.winners.clone()),
        decision: outcome.decision.message.clone(),
        is_bdb_includable: outcome.decision.is_includable(),
        assume_iso: outcome.assume_iso,
        req_tlsanl: outcome.req_tlsanl,
        transform: outcome.decision.transform(),
        signals,
        verification,
        b_group,
        skttls,
    }
}
