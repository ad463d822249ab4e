mod commands;
mod logging;

use bdb_core::domain::BdbError;
use clap::Parser;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_bdb_error();
            eprintln!("{}", error.diagnostic_line());
            eprintln!("{}", error.fatal_exit_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("bdb".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "bdb", version, about = "B-factor databank entry builder")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Create a bdb entry from a PDB file
    Create(commands::CreateArgs),
    /// Interpret a REMARK 3 "PROGRAM" field
    Refprog(commands::RefprogArgs),
    /// Write a WHY NOT entry
    Whynot(commands::WhynotArgs),
    /// Check that TLSANL can be executed
    CheckDeps(commands::CheckDepsArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Create(args) => commands::run_create_command(args),
        CliCommand::Refprog(args) => commands::run_refprog_command(args),
        CliCommand::Whynot(args) => commands::run_whynot_command(args),
        CliCommand::CheckDeps(args) => commands::run_check_deps_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(BdbError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<BdbError> for CliError {
    fn from(error: BdbError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_bdb_error(&self) -> BdbError {
        match self {
            Self::Usage(message) => BdbError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => BdbError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
