//! CSV tables written by the pipeline.
//!
//! One file per [`Table`], named `<table>.csv`, each starting with its header
//! row. Files are created up front so an export with no ways still produces
//! empty `path_*` tables.
//!
//! Every sink call encodes its rows completely before any byte reaches the
//! table file, so a row that fails to encode leaves the table as it was.

use std::{
    fmt,
    io::{self, BufWriter, Write},
};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use csv::WriterBuilder;
use mapclean_core::{
    ElementKind, PathEntity, PathReference, PointEntity, RecordSink, TagRecord,
};
use serde::Serialize;
use thiserror::Error;

/// The five output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// One row per node.
    PointEntities,
    /// Tags owned by nodes.
    PointTags,
    /// One row per way.
    PathEntities,
    /// Ordered node references of ways.
    PathReferences,
    /// Tags owned by ways.
    PathTags,
}

impl Table {
    /// Every table, parents before the tables that reference them.
    pub const ALL: [Self; 5] = [
        Self::PointEntities,
        Self::PointTags,
        Self::PathEntities,
        Self::PathReferences,
        Self::PathTags,
    ];

    /// Table name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PointEntities => "point_entities",
            Self::PointTags => "point_tags",
            Self::PathEntities => "path_entities",
            Self::PathReferences => "path_references",
            Self::PathTags => "path_tags",
        }
    }

    /// File name of the table inside an output directory.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    /// Header row, in column order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::PointEntities => &PointEntity::FIELDS,
            Self::PathEntities => &PathEntity::FIELDS,
            Self::PointTags | Self::PathTags => &TagRecord::FIELDS,
            Self::PathReferences => &PathReference::FIELDS,
        }
    }

    /// Tag table for entities of `kind`.
    #[must_use]
    pub const fn tags_for(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Node => Self::PointTags,
            ElementKind::Way => Self::PathTags,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by [`CsvRecordSink`].
#[derive(Debug, Error)]
pub enum CsvSinkError {
    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A table file could not be created.
    #[error("failed to create {table} table at {path}: {source}")]
    CreateFile {
        /// Table being created.
        table: Table,
        /// File that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing a row failed.
    #[error("failed to write to {table} table: {source}")]
    Write {
        /// Table being written.
        table: Table,
        /// Source error returned by `csv`.
        #[source]
        source: csv::Error,
    },
    /// Flushing buffered rows failed.
    #[error("failed to flush {table} table: {source}")]
    Flush {
        /// Table being flushed.
        table: Table,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Writes shaped records into five UTF-8 CSV files.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use mapclean_core::RecordSink;
/// use mapclean_data::CsvRecordSink;
///
/// let mut sink = CsvRecordSink::create(Utf8Path::new("out"))?;
/// sink.finish()?;
/// # Ok::<(), mapclean_data::CsvSinkError>(())
/// ```
#[derive(Debug)]
pub struct CsvRecordSink {
    dir: Utf8PathBuf,
    point_entities: BufWriter<fs_utf8::File>,
    point_tags: BufWriter<fs_utf8::File>,
    path_entities: BufWriter<fs_utf8::File>,
    path_references: BufWriter<fs_utf8::File>,
    path_tags: BufWriter<fs_utf8::File>,
}

impl CsvRecordSink {
    /// Create `dir` if needed and start every table with its header row.
    ///
    /// Existing table files are truncated.
    pub fn create(dir: &Utf8Path) -> Result<Self, CsvSinkError> {
        mapclean_fs::ensure_dir(dir).map_err(|source| CsvSinkError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            point_entities: open_table(dir, Table::PointEntities)?,
            point_tags: open_table(dir, Table::PointTags)?,
            path_entities: open_table(dir, Table::PathEntities)?,
            path_references: open_table(dir, Table::PathReferences)?,
            path_tags: open_table(dir, Table::PathTags)?,
        })
    }

    /// Directory holding the tables.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Path of `table` inside the output directory.
    #[must_use]
    pub fn table_path(&self, table: Table) -> Utf8PathBuf {
        self.dir.join(table.file_name())
    }

    fn writer(&mut self, table: Table) -> &mut BufWriter<fs_utf8::File> {
        match table {
            Table::PointEntities => &mut self.point_entities,
            Table::PointTags => &mut self.point_tags,
            Table::PathEntities => &mut self.path_entities,
            Table::PathReferences => &mut self.path_references,
            Table::PathTags => &mut self.path_tags,
        }
    }

    fn write_rows<T: Serialize>(&mut self, table: Table, rows: &[T]) -> Result<(), CsvSinkError> {
        let encoded = encode_rows(rows).map_err(|source| CsvSinkError::Write { table, source })?;
        self.writer(table)
            .write_all(&encoded)
            .map_err(|source| CsvSinkError::Write {
                table,
                source: source.into(),
            })
    }
}

/// Encode `rows` as CSV text without touching any table file.
fn encode_rows<T: Serialize>(rows: &[T]) -> Result<Vec<u8>, csv::Error> {
    let mut scratch = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        scratch.serialize(row)?;
    }
    scratch
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

fn open_table(dir: &Utf8Path, table: Table) -> Result<BufWriter<fs_utf8::File>, CsvSinkError> {
    let path = dir.join(table.file_name());
    let file = mapclean_fs::create_utf8_file(&path).map_err(|source| CsvSinkError::CreateFile {
        table,
        path: path.clone(),
        source,
    })?;
    let header = encode_rows(&[table.columns()])
        .map_err(|source| CsvSinkError::Write { table, source })?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&header)
        .map_err(|source| CsvSinkError::Write {
            table,
            source: source.into(),
        })?;
    Ok(writer)
}

impl RecordSink for CsvRecordSink {
    type Error = CsvSinkError;

    fn write_point_entity(&mut self, entity: &PointEntity) -> Result<(), Self::Error> {
        self.write_rows(Table::PointEntities, std::slice::from_ref(entity))
    }

    fn write_path_entity(&mut self, entity: &PathEntity) -> Result<(), Self::Error> {
        self.write_rows(Table::PathEntities, std::slice::from_ref(entity))
    }

    fn write_tags(&mut self, kind: ElementKind, tags: &[TagRecord]) -> Result<(), Self::Error> {
        self.write_rows(Table::tags_for(kind), tags)
    }

    fn write_path_references(&mut self, references: &[PathReference]) -> Result<(), Self::Error> {
        self.write_rows(Table::PathReferences, references)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        for table in Table::ALL {
            self.writer(table)
                .flush()
                .map_err(|source| CsvSinkError::Flush { table, source })?;
        }
        Ok(())
    }
}
