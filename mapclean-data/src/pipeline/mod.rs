//! Drives an export through reading, shaping, validation and writing.

use std::{error::Error as StdError, io::BufRead, io::BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use mapclean_core::{
    ElementKind, ElementShaper, MissingAttributeError, RawElement, RecordSink, SchemaContract,
    SchemaContractError, SchemaValidator, ValidationError,
};
use thiserror::Error;

use crate::{CsvRecordSink, ElementStream, ParseError};

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Check each bundle against `validator` before writing it.
    pub validate: bool,
    /// Contract checker used when `validate` is set.
    pub validator: SchemaValidator,
    /// Shaping and cleaning rules.
    pub shaper: ElementShaper,
    /// Element kinds to read from the source.
    pub kinds: Vec<ElementKind>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            validate: true,
            validator: SchemaValidator::default(),
            shaper: ElementShaper::default(),
            kinds: vec![ElementKind::Node, ElementKind::Way],
        }
    }
}

/// Counts gathered during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Point entities written.
    pub points: u64,
    /// Path entities written.
    pub paths: u64,
    /// Tag rows written across both tag tables.
    pub tags: u64,
    /// Path reference rows written.
    pub references: u64,
    /// Tags dropped for problem characters in their key.
    pub dropped_tags: u64,
    /// Whether bundles were validated.
    pub validated: bool,
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The input file could not be opened.
    #[error("failed to open map export {path}: {source}")]
    OpenInput {
        /// Input path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The schema contract file could not be read.
    #[error("failed to open schema contract {path}: {source}")]
    OpenContract {
        /// Contract path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The schema contract file was not a usable contract.
    #[error("invalid schema contract {path}: {source}")]
    Contract {
        /// Contract path.
        path: Utf8PathBuf,
        /// Parse or version error.
        #[source]
        source: SchemaContractError,
    },
    /// The source document could not be read.
    #[error("failed to read map export: {source}")]
    Parse {
        /// Reader error.
        #[source]
        source: ParseError,
    },
    /// An element lacked a required attribute.
    #[error("failed to shape element: {source}")]
    Shape {
        /// Missing attribute details.
        #[source]
        source: MissingAttributeError,
    },
    /// A shaped bundle did not satisfy the schema contract.
    #[error("{kind} {id} failed validation: {source}")]
    Validation {
        /// Kind of the failing element.
        kind: ElementKind,
        /// Identifier of the failing element.
        id: String,
        /// Field-level errors.
        #[source]
        source: ValidationError,
    },
    /// The sink rejected a write.
    #[error("failed to write records: {source}")]
    Sink {
        /// Error raised by the sink.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ProcessError {
    fn sink<E: StdError + Send + Sync + 'static>(source: E) -> Self {
        Self::Sink {
            source: Box::new(source),
        }
    }
}

/// Stream `reader` through the pipeline into `sink`.
///
/// Elements are handled one at a time in source order. The first error ends
/// the run; rows already handed to the sink stay written. The sink is
/// finished only on success.
///
/// # Examples
/// ```
/// use mapclean_core::test_support::MemorySink;
/// use mapclean_data::{ProcessOptions, process_map};
///
/// let xml = r#"<osm>
///   <node id="1" lat="40.7" lon="-73.9" user="m" uid="2" version="1"
///         changeset="3" timestamp="2016-01-01T00:00:00Z">
///     <tag k="addr:street" v="5th Ave"/>
///   </node>
/// </osm>"#;
/// let mut sink = MemorySink::new();
///
/// let report = process_map(xml.as_bytes(), &mut sink, &ProcessOptions::default())?;
///
/// assert_eq!(report.points, 1);
/// assert_eq!(sink.point_tags[0].value, "5th Avenue");
/// # Ok::<(), mapclean_data::ProcessError>(())
/// ```
pub fn process_map<R, S>(
    reader: R,
    sink: S,
    options: &ProcessOptions,
) -> Result<ProcessReport, ProcessError>
where
    R: BufRead,
    S: RecordSink,
{
    let elements = ElementStream::with_kinds(reader, options.kinds.iter().copied());
    run_elements(elements, sink, options)
}

fn run_elements<I, S>(
    elements: I,
    mut sink: S,
    options: &ProcessOptions,
) -> Result<ProcessReport, ProcessError>
where
    I: Iterator<Item = Result<RawElement, ParseError>>,
    S: RecordSink,
{
    let mut report = ProcessReport {
        validated: options.validate,
        ..ProcessReport::default()
    };
    if !options.validate {
        warn!("schema validation disabled; bundles are written unchecked");
    }
    info!(
        "processing map export (postcode order: {})",
        options.shaper.cleaner().postcode_order()
    );

    for element in elements {
        let element = element.map_err(|source| ProcessError::Parse { source })?;
        let shaped = options
            .shaper
            .shape(&element)
            .map_err(|source| ProcessError::Shape { source })?;
        if options.validate {
            options
                .validator
                .validate(&shaped)
                .map_err(|source| ProcessError::Validation {
                    kind: shaped.kind(),
                    id: shaped.id().to_owned(),
                    source,
                })?;
        }
        sink.write_shaped(&shaped).map_err(ProcessError::sink)?;

        match shaped.kind() {
            ElementKind::Node => report.points += 1,
            ElementKind::Way => report.paths += 1,
        }
        report.tags += count(shaped.tags().len());
        report.references += count(shaped.references().len());
        report.dropped_tags += count(element.tags().len().saturating_sub(shaped.tags().len()));
    }

    sink.finish().map_err(ProcessError::sink)?;
    info!(
        "processed {} points, {} paths, {} tags, {} references; dropped {} tags",
        report.points, report.paths, report.tags, report.references, report.dropped_tags
    );
    Ok(report)
}

/// Process the export at `input` into CSV tables under `output_dir`.
///
/// The first element is read before any table is created, so input that
/// fails at once (an empty or non-XML file) leaves `output_dir` untouched.
pub fn process_file(
    input: &Utf8Path,
    output_dir: &Utf8Path,
    options: &ProcessOptions,
) -> Result<ProcessReport, ProcessError> {
    let file = mapclean_fs::open_utf8_file(input).map_err(|source| ProcessError::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;
    let mut elements =
        ElementStream::with_kinds(BufReader::new(file), options.kinds.iter().copied()).peekable();
    if let Some(Err(_)) = elements.peek()
        && let Some(Err(source)) = elements.next()
    {
        return Err(ProcessError::Parse { source });
    }
    let sink = CsvRecordSink::create(output_dir).map_err(ProcessError::sink)?;
    info!("reading {input}, writing tables to {output_dir}");
    run_elements(elements, sink, options)
}

/// Read a schema contract from a JSON file.
pub fn load_contract(path: &Utf8Path) -> Result<SchemaContract, ProcessError> {
    let file = mapclean_fs::open_utf8_file(path).map_err(|source| ProcessError::OpenContract {
        path: path.to_path_buf(),
        source,
    })?;
    SchemaContract::from_reader(BufReader::new(file)).map_err(|source| ProcessError::Contract {
        path: path.to_path_buf(),
        source,
    })
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;
