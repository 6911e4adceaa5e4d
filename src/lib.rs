//! Facade crate for the mapclean export pipeline.
//!
//! This crate re-exports the cleaning, shaping and validation types and, behind
//! the `data` feature, the streaming reader, CSV writer and SQLite loader.

#![forbid(unsafe_code)]

pub use mapclean_core::{
    CleaningTables, ElementKind, ElementShaper, MissingAttributeError, PostcodeOrder, RawElement,
    RecordSink, SchemaContract, SchemaContractError, SchemaValidator, ShapedElement,
    ValidationError, ValueCleaner,
};

#[cfg(feature = "data")]
pub use mapclean_data::{
    CsvRecordSink, CsvSinkError, ElementStream, ParseError, ProcessError, ProcessOptions,
    ProcessReport, Table, process_file, process_map,
};

#[cfg(feature = "store-sqlite")]
pub use mapclean_data::{LoadError, LoadOptions, LoadReport, load_tables};
