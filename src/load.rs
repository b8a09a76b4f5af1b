//! Bulk loading of generated data files with `LOAD DATA INFILE`.
//!
//! The statement is executed by the server, so `data_dir` must be readable by
//! `mysqld` and allowed by its `secure_file_priv` setting.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::db::DatabaseClient;
use crate::error::{Result, TpchError};
use crate::schema::Table;

/// Default field terminator, in MySQL escape syntax.
pub const DEFAULT_FIELD_TERMINATOR: &str = "\\t";

/// Default line terminator, in MySQL escape syntax.
pub const DEFAULT_LINE_TERMINATOR: &str = "\\n";

/// Options for one load run.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    pub tables: Vec<Table>,
    pub truncate: bool,
    pub field_terminated_by: String,
    pub line_terminated_by: String,
    pub ignore_header_lines: u64,
}

impl LoadOptions {
    /// Loads every table from `data_dir` with the default terminators.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            tables: Table::ALL.to_vec(),
            truncate: false,
            field_terminated_by: DEFAULT_FIELD_TERMINATOR.to_string(),
            line_terminated_by: DEFAULT_LINE_TERMINATOR.to_string(),
            ignore_header_lines: 1,
        }
    }
}

/// Escapes a value for a single-quoted SQL string literal.
pub fn mysql_string_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}

/// Escapes a terminator for a single-quoted literal, keeping backslashes.
///
/// MySQL itself interprets `\t`, `\n` and friends inside the literal.
pub fn mysql_delimiter_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// MySQL escape form of a single delimiter byte, as produced by the generator.
pub fn field_terminator(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        b'\\' => "\\\\".to_string(),
        b => char::from(b).to_string(),
    }
}

/// Builds the `LOAD DATA INFILE` statement for one table.
pub fn load_statement(table: Table, path: &Path, options: &LoadOptions) -> String {
    format!(
        "LOAD DATA INFILE '{}' INTO TABLE `{}` \
         FIELDS TERMINATED BY '{}' \
         LINES TERMINATED BY '{}' \
         IGNORE {} LINES",
        mysql_string_literal(&path.to_string_lossy()),
        table.name(),
        mysql_delimiter_literal(&options.field_terminated_by),
        mysql_delimiter_literal(&options.line_terminated_by),
        options.ignore_header_lines
    )
}

/// Absolute path of a table's data file, as the server will see it.
fn data_file(data_dir: &Path, table: Table) -> Result<PathBuf> {
    let path = data_dir.join(table.file_name());
    if !path.is_file() {
        return Err(TpchError::io(format!(
            "data file for {table} not found: {}",
            path.display()
        )));
    }
    std::fs::canonicalize(&path)
        .map_err(|e| TpchError::io(format!("resolve {}: {e}", path.display())))
}

/// Empties each target table.
pub async fn truncate_tables(db: &mut dyn DatabaseClient, tables: &[Table]) -> Result<()> {
    for table in tables {
        db.execute(&format!("TRUNCATE TABLE `{}`", table.name()))
            .await
            .map_err(|e| {
                TpchError::query(format!("truncate table {table}: {}", e.message()))
            })?;
    }
    Ok(())
}

/// Loads every requested table, stopping at the first failure.
///
/// All data files are checked before anything is truncated or loaded.
pub async fn load_tables(db: &mut dyn DatabaseClient, options: &LoadOptions) -> Result<()> {
    let files = options
        .tables
        .iter()
        .map(|&table| data_file(&options.data_dir, table).map(|path| (table, path)))
        .collect::<Result<Vec<_>>>()?;

    if options.truncate {
        truncate_tables(db, &options.tables).await?;
    }

    for (table, path) in files {
        let start = Instant::now();
        let rows = db
            .execute(&load_statement(table, &path, options))
            .await
            .map_err(|e| {
                TpchError::query(format!(
                    "load table {table} from {}: {}",
                    path.display(),
                    e.message()
                ))
            })?;
        info!(
            "Loaded {table}: {rows} rows in {:.2}s",
            start.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
