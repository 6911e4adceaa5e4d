//! Load exported CSV tables into a relational SQLite database.
#![forbid(unsafe_code)]

use std::{collections::BTreeMap, io};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use csv::{Reader, ReaderBuilder};
use log::{debug, info};
use rusqlite::{Connection, Error as SqliteError, Transaction, params_from_iter};
use thiserror::Error;

use crate::Table;

/// Options for [`load_tables`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Enforce the declared foreign keys while inserting.
    ///
    /// Off by default: extracts cut from a larger map routinely reference
    /// nodes that fall outside the extract.
    pub enforce_foreign_keys: bool,
}

/// Rows inserted per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    rows: BTreeMap<Table, u64>,
}

impl LoadReport {
    /// Rows inserted into `table`.
    #[must_use]
    pub fn rows(&self, table: Table) -> u64 {
        self.rows.get(&table).copied().unwrap_or_default()
    }

    /// Rows inserted across all tables.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.values().sum()
    }
}

/// Errors raised when loading tables into SQLite.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A table file was absent from the tables directory.
    #[error("missing {table} table at {path}")]
    MissingTable {
        /// Table that was expected.
        table: Table,
        /// Location that was checked.
        path: Utf8PathBuf,
    },
    /// A table file could not be opened.
    #[error("failed to open {table} table at {path}: {source}")]
    OpenTable {
        /// Table being read.
        table: Table,
        /// File that could not be opened.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A table's header row did not match its expected columns.
    #[error("unexpected header in {table} table: {found:?}")]
    UnexpectedHeader {
        /// Table being read.
        table: Table,
        /// Header that was found.
        found: Vec<String>,
    },
    /// Reading a CSV row failed.
    #[error("failed to read {table} table: {source}")]
    ReadRow {
        /// Table being read.
        table: Table,
        /// Source error returned by `csv`.
        #[source]
        source: csv::Error,
    },
    /// Failed to create the parent directory for the database.
    #[error("failed to create parent directory for {path}: {source}")]
    CreateDirectory {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Setting SQLite foreign-key enforcement failed.
    #[error("failed to configure SQLite foreign keys: {source}")]
    ForeignKeys {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the transaction failed.
    #[error("failed to begin load transaction: {source}")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating a table failed.
    #[error("failed to create {table} table: {source}")]
    CreateSchema {
        /// Table being created.
        table: Table,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Preparing the insert statement failed.
    #[error("failed to prepare insert into {table}: {source}")]
    PrepareInsert {
        /// Table being loaded.
        table: Table,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Inserting a row failed.
    #[error("failed to insert row {row} into {table}: {source}")]
    PersistRow {
        /// Table being loaded.
        table: Table,
        /// One-based data row number within the CSV file.
        row: u64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the transaction failed.
    #[error("failed to commit load transaction: {source}")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Load the five CSV tables in `tables_dir` into the SQLite database at
/// `database`.
///
/// Existing tables of the same names are replaced. Every table file is opened
/// and its header checked before the database is touched. Rows then stream
/// from each file into its insert statement inside one transaction, so a
/// failure part-way through leaves the database untouched.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use mapclean_data::{LoadOptions, Table, load_tables};
///
/// let report = load_tables(
///     Utf8Path::new("out"),
///     Utf8Path::new("map.db"),
///     LoadOptions::default(),
/// )?;
/// println!("{} nodes", report.rows(Table::PointEntities));
/// # Ok::<(), mapclean_data::LoadError>(())
/// ```
pub fn load_tables(
    tables_dir: &Utf8Path,
    database: &Utf8Path,
    options: LoadOptions,
) -> Result<LoadReport, LoadError> {
    let readers = Table::ALL
        .into_iter()
        .map(|table| open_table(tables_dir, table).map(|reader| (table, reader)))
        .collect::<Result<Vec<_>, _>>()?;

    mapclean_fs::ensure_parent_dir(database).map_err(|source| LoadError::CreateDirectory {
        path: database.to_path_buf(),
        source,
    })?;
    let mut connection =
        Connection::open(database.as_std_path()).map_err(|source| LoadError::Open {
            path: database.to_path_buf(),
            source,
        })?;
    connection
        .pragma_update(None, "foreign_keys", options.enforce_foreign_keys)
        .map_err(|source| LoadError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| LoadError::BeginTransaction { source })?;
    create_schema(&transaction)?;
    let mut report = LoadReport::default();
    for (table, mut reader) in readers {
        let inserted = persist_rows(&transaction, table, &mut reader)?;
        debug!("loaded {inserted} rows into {table}");
        report.rows.insert(table, inserted);
    }
    transaction
        .commit()
        .map_err(|source| LoadError::Commit { source })?;

    info!(
        "loaded {} rows from {tables_dir} into {database}",
        report.total()
    );
    Ok(report)
}

fn open_table(dir: &Utf8Path, table: Table) -> Result<Reader<fs_utf8::File>, LoadError> {
    let path = dir.join(table.file_name());
    let file = mapclean_fs::open_utf8_file(&path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::MissingTable {
                table,
                path: path.clone(),
            }
        } else {
            LoadError::OpenTable {
                table,
                path: path.clone(),
                source,
            }
        }
    })?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let header = reader
        .headers()
        .map_err(|source| LoadError::ReadRow { table, source })?;
    if !header.iter().eq(table.columns().iter().copied()) {
        return Err(LoadError::UnexpectedHeader {
            table,
            found: header.iter().map(str::to_owned).collect(),
        });
    }
    Ok(reader)
}

fn create_schema(transaction: &Transaction<'_>) -> Result<(), LoadError> {
    for table in Table::ALL.into_iter().rev() {
        transaction
            .execute(&format!("DROP TABLE IF EXISTS {}", table.name()), [])
            .map_err(|source| LoadError::CreateSchema { table, source })?;
    }
    for table in Table::ALL {
        transaction
            .execute(table_ddl(table), [])
            .map_err(|source| LoadError::CreateSchema { table, source })?;
    }
    Ok(())
}

const fn table_ddl(table: Table) -> &'static str {
    match table {
        Table::PointEntities => {
            "CREATE TABLE point_entities (
                id INTEGER PRIMARY KEY NOT NULL,
                lat REAL,
                lon REAL,
                user TEXT,
                uid INTEGER,
                version TEXT,
                changeset INTEGER,
                timestamp TEXT
            )"
        }
        Table::PointTags => {
            "CREATE TABLE point_tags (
                id INTEGER NOT NULL REFERENCES point_entities (id),
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                type TEXT
            )"
        }
        Table::PathEntities => {
            "CREATE TABLE path_entities (
                id INTEGER PRIMARY KEY NOT NULL,
                user TEXT,
                uid INTEGER,
                version TEXT,
                changeset INTEGER,
                timestamp TEXT
            )"
        }
        Table::PathReferences => {
            "CREATE TABLE path_references (
                id INTEGER NOT NULL REFERENCES path_entities (id),
                node_id INTEGER NOT NULL REFERENCES point_entities (id),
                position INTEGER NOT NULL
            )"
        }
        Table::PathTags => {
            "CREATE TABLE path_tags (
                id INTEGER NOT NULL REFERENCES path_entities (id),
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                type TEXT
            )"
        }
    }
}

fn insert_sql(table: Table) -> String {
    let columns = table.columns();
    let names = columns
        .iter()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({names}) VALUES ({placeholders})", table.name())
}

fn persist_rows(
    transaction: &Transaction<'_>,
    table: Table,
    reader: &mut Reader<fs_utf8::File>,
) -> Result<u64, LoadError> {
    let mut statement = transaction
        .prepare(&insert_sql(table))
        .map_err(|source| LoadError::PrepareInsert { table, source })?;
    let mut inserted = 0;
    for record in reader.records() {
        let record = record.map_err(|source| LoadError::ReadRow { table, source })?;
        inserted += 1;
        statement
            .execute(params_from_iter(record.iter()))
            .map_err(|source| LoadError::PersistRow {
                table,
                row: inserted,
                source,
            })?;
    }
    Ok(inserted)
}
