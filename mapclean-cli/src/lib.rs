//! Command-line interface for the mapclean export pipeline.
//!
//! `mapclean process` turns an OSM XML export into five CSV tables and
//! `mapclean load` copies those tables into SQLite. Settings layer from CLI
//! flags, configuration files and `MAPCLEAN_*` environment variables.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};

mod error;
#[cfg(feature = "store-sqlite")]
mod load;
mod process;

pub use error::CliError;
#[cfg(feature = "store-sqlite")]
use load::{LoadArgs, run_load};
use process::{ProcessArgs, run_process};

pub(crate) const ARG_INPUT: &str = "input";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_VALIDATE: &str = "validate";
pub(crate) const ARG_POSTCODE_ORDER: &str = "postcode-order";
pub(crate) const ARG_SCHEMA: &str = "schema";
pub(crate) const ENV_INPUT: &str = "MAPCLEAN_CMDS_PROCESS_INPUT";
pub(crate) const ENV_OUTPUT_DIR: &str = "MAPCLEAN_CMDS_PROCESS_OUTPUT_DIR";

#[cfg(feature = "store-sqlite")]
pub(crate) const ARG_TABLES_DIR: &str = "tables-dir";
#[cfg(feature = "store-sqlite")]
pub(crate) const ARG_DATABASE: &str = "database";
#[cfg(feature = "store-sqlite")]
pub(crate) const ARG_ENFORCE_FOREIGN_KEYS: &str = "enforce-foreign-keys";
#[cfg(feature = "store-sqlite")]
pub(crate) const ENV_TABLES_DIR: &str = "MAPCLEAN_CMDS_LOAD_TABLES_DIR";
#[cfg(feature = "store-sqlite")]
pub(crate) const ENV_DATABASE: &str = "MAPCLEAN_CMDS_LOAD_DATABASE";

/// Run the mapclean CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let summary = match cli.command {
        Command::Process(args) => {
            let outcome = run_process(args)?;
            outcome.summary()
        }
        #[cfg(feature = "store-sqlite")]
        Command::Load(args) => {
            let outcome = run_load(args)?;
            outcome.summary()
        }
    };
    writeln!(std::io::stdout().lock(), "{summary}").map_err(CliError::WriteSummary)
}

#[derive(Debug, Parser)]
#[command(
    name = "mapclean",
    about = "Clean OpenStreetMap XML exports into relational tables",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Clean a map export and write its CSV tables.
    Process(ProcessArgs),
    /// Load previously written CSV tables into SQLite.
    #[cfg(feature = "store-sqlite")]
    Load(LoadArgs),
}

/// Fail unless `path` names an existing regular file.
pub(crate) fn require_existing_file(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match mapclean_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Fail if `path` names an existing file rather than a directory.
///
/// Missing directories are fine; they are created on demand.
pub(crate) fn reject_file_as_directory(
    path: &Utf8Path,
    field: &'static str,
) -> Result<(), CliError> {
    match mapclean_fs::file_is_file(path) {
        Ok(true) => Err(CliError::OutputPathNotDirectory {
            field,
            path: path.to_path_buf(),
        }),
        Ok(false) => Ok(()),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests;
