//! Load command implementation for the mapclean CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::debug;
use mapclean_data::{LoadOptions, LoadReport, load_tables};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_ENFORCE_FOREIGN_KEYS, ARG_TABLES_DIR, CliError, ENV_DATABASE,
    ENV_TABLES_DIR,
};

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read the CSV tables written by `process` and insert them \
                 into a SQLite database, replacing any existing tables of \
                 the same names.",
    about = "Load CSV tables into SQLite"
)]
#[ortho_config(prefix = "MAPCLEAN")]
pub(crate) struct LoadArgs {
    /// Directory holding the CSV tables.
    #[arg(long = ARG_TABLES_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) tables_dir: Option<Utf8PathBuf>,
    /// SQLite database to create or update.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Reject rows whose references point outside the loaded tables.
    #[arg(long = ARG_ENFORCE_FOREIGN_KEYS, value_name = "bool")]
    #[serde(default)]
    pub(crate) enforce_foreign_keys: Option<bool>,
}

impl LoadArgs {
    pub(crate) fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LoadConfig::try_from(merged)
    }
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadConfig {
    pub(crate) tables_dir: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
    pub(crate) options: LoadOptions,
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let tables_dir = args.tables_dir.ok_or(CliError::MissingArgument {
            field: ARG_TABLES_DIR,
            env: ENV_TABLES_DIR,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_DATABASE,
        })?;
        Ok(Self {
            tables_dir,
            database,
            options: LoadOptions {
                enforce_foreign_keys: args.enforce_foreign_keys.unwrap_or_default(),
            },
        })
    }
}

/// Result of a completed `load` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadOutcome {
    pub(crate) database: Utf8PathBuf,
    pub(crate) report: LoadReport,
}

impl LoadOutcome {
    pub(crate) fn summary(&self) -> String {
        format!(
            "loaded {} rows into {}",
            self.report.total(),
            self.database
        )
    }
}

pub(crate) fn run_load(args: LoadArgs) -> Result<LoadOutcome, CliError> {
    let config = args.into_config()?;
    execute_load(&config)
}

pub(crate) fn execute_load(config: &LoadConfig) -> Result<LoadOutcome, CliError> {
    debug!(
        "loading tables from {} into {}",
        config.tables_dir, config.database
    );
    let report = load_tables(&config.tables_dir, &config.database, config.options)?;
    Ok(LoadOutcome {
        database: config.database.clone(),
        report,
    })
}
