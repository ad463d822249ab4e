use super::CliError;
use super::logging::{init_console, init_entry_log};
use bdb_core::common::config::{EntryConfig, TlsanlConfig, validate_pdb_id};
use bdb_core::domain::{BdbError, ProgramMention, ProvenanceDecision};
use bdb_core::modules::provenance::resolve_last_used;
use bdb_core::modules::serialization::{to_sorted_json, write_whynot};
use bdb_core::modules::tlsanl::check_dependencies;
use bdb_core::modules::{
    EntryCollaborators, TextNormalizer, TlsanlRunner, UnsupportedMethodLedger, create_bdb_entry,
    prepare_entry_dir,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub(super) struct CreateArgs {
    /// Root directory of the bdb databank
    #[arg(value_name = "BDB_ROOT")]
    bdb_root: PathBuf,

    /// PDB file to create the entry from
    #[arg(value_name = "PDB_FILE")]
    pdb_file: PathBuf,

    /// PDB identifier of the entry
    #[arg(value_name = "PDB_ID")]
    pdb_id: String,

    /// Write DEBUG messages to the entry log
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    tlsanl: TlsanlFlags,

    /// Ledger of unsupported experimental methods, updated in place
    #[arg(long, value_name = "FILE")]
    unsupported_expdta: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct TlsanlFlags {
    /// TLSANL executable
    #[arg(long = "tlsanl", value_name = "PATH", default_value = "tlsanl")]
    executable: PathBuf,
}

impl TlsanlFlags {
    fn into_config(self) -> TlsanlConfig {
        TlsanlConfig {
            executable: self.executable,
            ..TlsanlConfig::default()
        }
    }
}

impl CreateArgs {
    fn into_config(self) -> Result<(EntryConfig, Option<PathBuf>), CliError> {
        require_directory(&self.bdb_root)?;
        require_nonempty_file(&self.pdb_file)?;
        validate_pdb_id(&self.pdb_id)?;

        let mut config = EntryConfig::new(self.bdb_root, self.pdb_file, self.pdb_id);
        config.verbose = self.verbose;
        config.tlsanl = self.tlsanl.into_config();
        Ok((config, self.unsupported_expdta))
    }
}

#[derive(clap::Args)]
pub(super) struct RefprogArgs {
    /// Content of the REMARK 3 "PROGRAM" field
    #[arg(value_name = "TEXT")]
    text: String,

    /// Print DEBUG messages
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args)]
pub(super) struct WhynotArgs {
    /// Directory to write the WHY NOT entry to
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    #[arg(value_name = "PDB_ID")]
    pdb_id: String,

    /// Reason written to the COMMENT line
    #[arg(value_name = "REASON")]
    reason: String,
}

#[derive(clap::Args)]
pub(super) struct CheckDepsArgs {
    #[command(flatten)]
    tlsanl: TlsanlFlags,
}

#[derive(Serialize)]
struct RefprogReport {
    mentions: Vec<ProgramMention>,
    last_used: ProvenanceDecision,
}

pub(super) fn run_create_command(args: CreateArgs) -> Result<i32, CliError> {
    let (config, ledger_path) = args.into_config()?;
    let entry_dir = prepare_entry_dir(&config)?;
    init_entry_log(&entry_dir, &config.pdb_id, config.verbose)?;

    let mut ledger = match &ledger_path {
        Some(path) => Some(UnsupportedMethodLedger::load(path)?),
        None => None,
    };
    let deconvolver = TlsanlRunner::new(&config.tlsanl);
    let outcome = create_bdb_entry(
        &config,
        EntryCollaborators {
            deconvolver: &deconvolver,
            ledger: ledger.as_mut(),
        },
    )?;
    if let (Some(path), Some(ledger)) = (&ledger_path, &ledger) {
        ledger.persist(path)?;
    }

    if outcome.created_bdb {
        println!(
            "Created {}",
            outcome.entry_dir.join(format!("{}.bdb", config.pdb_id)).display()
        );
    } else {
        println!(
            "No bdb entry for {}: {}",
            config.pdb_id,
            outcome.whynot.as_deref().unwrap_or("not created")
        );
    }
    Ok(0)
}

pub(super) fn run_refprog_command(args: RefprogArgs) -> Result<i32, CliError> {
    init_console(args.verbose)?;
    let normalizer = TextNormalizer::new()?;
    let mentions = normalizer.normalize(&args.text);
    let last_used = resolve_last_used(&mentions);
    println!("{}", to_sorted_json(&RefprogReport { mentions, last_used })?);
    Ok(0)
}

pub(super) fn run_whynot_command(args: WhynotArgs) -> Result<i32, CliError> {
    require_directory(&args.dir)?;
    validate_pdb_id(&args.pdb_id)?;
    init_console(false)?;
    let path = write_whynot(&args.dir, &args.pdb_id, &args.reason)?;
    println!("{}", path.display());
    Ok(0)
}

pub(super) fn run_check_deps_command(args: CheckDepsArgs) -> Result<i32, CliError> {
    init_console(false)?;
    let config = args.tlsanl.into_config();
    check_dependencies(&config)?;
    println!("{} set up properly", config.executable.display());
    Ok(0)
}

fn require_directory(path: &Path) -> Result<(), CliError> {
    if path.is_dir() {
        return Ok(());
    }
    Err(BdbError::input_validation(
        "INPUT.BDB_ROOT",
        format!("directory '{}' does not exist", path.display()),
    )
    .into())
}

fn require_nonempty_file(path: &Path) -> Result<(), CliError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() && metadata.len() > 0 => Ok(()),
        Ok(_) => Err(BdbError::input_validation(
            "INPUT.PDB_FILE",
            format!("'{}' is not a non-empty file", path.display()),
        )
        .into()),
        Err(source) => Err(BdbError::input_validation(
            "INPUT.PDB_FILE",
            format!("cannot read '{}': {}", path.display(), source),
        )
        .into()),
    }
}
