//! Reading, writing and loading for the mapclean pipeline.
//!
//! Responsibilities:
//! - Stream OSM XML exports element by element ([`ElementStream`]).
//! - Write shaped records as CSV tables ([`CsvRecordSink`]).
//! - Drive a whole run ([`process_map`], [`process_file`]).
//! - Load finished tables into SQLite ([`load_tables`], `store-sqlite`
//!   feature).
//!
//! Boundaries:
//! - Cleaning and shaping rules live in `mapclean-core`.
//! - Filesystem access goes through `mapclean-fs`.
//!
//! Invariants:
//! - At most one source element is held in memory at a time.
//! - Rows are written in source order.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod csv_sink;
#[cfg(feature = "store-sqlite")]
mod load;
mod pipeline;
mod stream;

pub use csv_sink::{CsvRecordSink, CsvSinkError, Table};
#[cfg(feature = "store-sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "store-sqlite")))]
pub use load::{LoadError, LoadOptions, LoadReport, load_tables};
pub use pipeline::{
    ProcessError, ProcessOptions, ProcessReport, load_contract, process_file, process_map,
};
pub use stream::{ElementStream, ParseError};
