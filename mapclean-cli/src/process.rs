//! Process command implementation for the mapclean CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::debug;
use mapclean_core::{
    CleaningTables, ElementShaper, PostcodeOrder, SchemaValidator, ValueCleaner,
};
use mapclean_data::{ProcessOptions, ProcessReport, load_contract, process_file};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_INPUT, ARG_OUTPUT_DIR, ARG_POSTCODE_ORDER, ARG_SCHEMA, ARG_VALIDATE, CliError, ENV_INPUT,
    ENV_OUTPUT_DIR, reject_file_as_directory, require_existing_file,
};

/// CLI arguments for the `process` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Stream an OpenStreetMap XML export, clean its tag values, \
                 check each element against the schema contract and write \
                 the point and path tables as CSV files. Paths can come \
                 from CLI flags, configuration files, or environment \
                 variables.",
    about = "Clean a map export into CSV tables"
)]
#[ortho_config(prefix = "MAPCLEAN")]
pub(crate) struct ProcessArgs {
    /// Path to the OpenStreetMap XML export.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Directory receiving the CSV tables.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Check every element against the schema contract (default: true).
    #[arg(long = ARG_VALIDATE, value_name = "bool")]
    #[serde(default)]
    pub(crate) validate: Option<bool>,
    /// Postcode comparison mode: `numeric` or `lexicographic`.
    #[arg(long = ARG_POSTCODE_ORDER, value_name = "order")]
    #[serde(default)]
    pub(crate) postcode_order: Option<PostcodeOrder>,
    /// JSON schema contract replacing the built-in one.
    #[arg(long = ARG_SCHEMA, value_name = "path")]
    #[serde(default)]
    pub(crate) schema: Option<Utf8PathBuf>,
}

impl ProcessArgs {
    pub(crate) fn into_config(self) -> Result<ProcessConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ProcessConfig::try_from(merged)
    }
}

/// Resolved `process` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcessConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) validate: bool,
    pub(crate) postcode_order: PostcodeOrder,
    pub(crate) schema: Option<Utf8PathBuf>,
}

impl ProcessConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing_file(&self.input, ARG_INPUT)?;
        if let Some(schema) = &self.schema {
            require_existing_file(schema, ARG_SCHEMA)?;
        }
        reject_file_as_directory(&self.output_dir, ARG_OUTPUT_DIR)
    }

    /// Build pipeline options, reading the schema contract when one is set.
    pub(crate) fn options(&self) -> Result<ProcessOptions, CliError> {
        let validator = match &self.schema {
            Some(path) => SchemaValidator::new(load_contract(path)?),
            None => SchemaValidator::default(),
        };
        let cleaner = ValueCleaner::new(CleaningTables::default(), self.postcode_order);
        Ok(ProcessOptions {
            validate: self.validate,
            validator,
            shaper: ElementShaper::new(cleaner),
            ..ProcessOptions::default()
        })
    }
}

impl TryFrom<ProcessArgs> for ProcessConfig {
    type Error = CliError;

    fn try_from(args: ProcessArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;
        let output_dir = args.output_dir.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_DIR,
            env: ENV_OUTPUT_DIR,
        })?;
        Ok(Self {
            input,
            output_dir,
            validate: args.validate.unwrap_or(true),
            postcode_order: args.postcode_order.unwrap_or_default(),
            schema: args.schema,
        })
    }
}

/// Result of a completed `process` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcessOutcome {
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) report: ProcessReport,
}

impl ProcessOutcome {
    pub(crate) fn summary(&self) -> String {
        let report = &self.report;
        let mut summary = format!(
            "wrote {} points, {} paths, {} tags and {} references to {}",
            report.points, report.paths, report.tags, report.references, self.output_dir
        );
        if report.dropped_tags > 0 {
            summary.push_str(&format!(" ({} tags dropped)", report.dropped_tags));
        }
        if !report.validated {
            summary.push_str(" without validation");
        }
        summary
    }
}

pub(crate) fn resolve_process_config(args: ProcessArgs) -> Result<ProcessConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

pub(crate) fn run_process(args: ProcessArgs) -> Result<ProcessOutcome, CliError> {
    let config = resolve_process_config(args)?;
    execute_process(&config)
}

pub(crate) fn execute_process(config: &ProcessConfig) -> Result<ProcessOutcome, CliError> {
    debug!(
        "processing {} into {} (postcode order {})",
        config.input, config.output_dir, config.postcode_order
    );
    let options = config.options()?;
    let report = process_file(&config.input, &config.output_dir, &options)?;
    Ok(ProcessOutcome {
        output_dir: config.output_dir.clone(),
        report,
    })
}
