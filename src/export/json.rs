//! JSON assembly and persistence of exported rows.
//!
//! Rows arrive in query order and are folded into either an array (the
//! default) or an object keyed by one column's value. The folded result is
//! serialized to a single JSON string, which can be returned to the caller or
//! written to a file or async writer.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::{key_to_string, Row};

/// Rows folded for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportResult {
    /// Rows in query order.
    Rows(Vec<Row>),
    /// Rows addressed by the string form of their key column.
    ///
    /// A repeated key keeps the position of its first occurrence and the row
    /// of its last.
    Keyed(IndexMap<String, Row>),
}

impl ExportResult {
    /// Number of entries in the result.
    pub fn len(&self) -> usize {
        match self {
            ExportResult::Rows(rows) => rows.len(),
            ExportResult::Keyed(map) => map.len(),
        }
    }

    /// Returns true if the result has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true for keyed (object) output.
    pub fn is_keyed(&self) -> bool {
        matches!(self, ExportResult::Keyed(_))
    }

    /// Serializes the result to a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Json` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Folds rows into an [`ExportResult`].
///
/// Without a key the rows are kept in order. With a key, each row is stored
/// under the string form of its `key` column; later rows overwrite earlier
/// rows with the same key. Rows that have no `key` column are skipped.
///
/// Rows are consumed one at a time, so this works directly over a query
/// cursor.
///
/// # Errors
///
/// Returns the first error yielded by `rows`.
pub fn assemble<I>(rows: I, key: Option<&str>) -> Result<ExportResult>
where
    I: IntoIterator<Item = Result<Row>>,
{
    assemble_projected(rows, key, &[])
}

/// Like [`assemble`], but keeps only `columns` of each row, in that order.
///
/// The key is read before projection, so rows can be keyed by a column
/// that the projection leaves out. An empty `columns` keeps every field.
///
/// # Errors
///
/// Returns the first error yielded by `rows`.
pub fn assemble_projected<I>(rows: I, key: Option<&str>, columns: &[String]) -> Result<ExportResult>
where
    I: IntoIterator<Item = Result<Row>>,
{
    let Some(key) = key else {
        let rows = rows
            .into_iter()
            .map(|row| row.map(|row| project(row, columns)))
            .collect::<Result<Vec<_>>>()?;
        debug!(rows = rows.len(), "Assembled row array");
        return Ok(ExportResult::Rows(rows));
    };

    let mut keyed = IndexMap::new();
    let mut seen = 0usize;
    let mut skipped = 0usize;

    for row in rows {
        let row = row?;
        seen += 1;

        let Some(value) = row.get(key) else {
            skipped += 1;
            continue;
        };
        let k = key_to_string(value);
        keyed.insert(k, project(row, columns));
    }

    if skipped > 0 {
        warn!(key, skipped, "Rows without the key column were left out");
    }
    debug!(rows = seen, entries = keyed.len(), key, "Assembled keyed object");

    Ok(ExportResult::Keyed(keyed))
}

/// Keeps the listed fields of a row, in list order.
///
/// Fields the row does not have are left out. An empty list returns the row
/// unchanged.
pub fn project(mut row: Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row;
    }
    let mut out = Row::with_capacity(columns.len());
    for column in columns {
        if let Some(value) = row.remove(column) {
            out.insert(column.clone(), value);
        }
    }
    out
}

/// Writes an exported JSON string to a file.
///
/// An existing file is truncated. Parent directories are not created, and a
/// failed write may leave a partial file behind.
///
/// # Errors
///
/// Returns `ExportError::Io` if the file cannot be created or written.
pub async fn export_to_file(json: &str, file_path: &Path) -> Result<()> {
    let file = File::create(file_path).await?;
    let writer = BufWriter::new(file);

    let bytes = export_to_stream(json, writer).await?;
    info!(path = %file_path.display(), bytes, "Wrote JSON export");
    Ok(())
}

/// Writes an exported JSON string to an async writer.
///
/// # Returns
///
/// The number of bytes written.
///
/// # Errors
///
/// Returns `ExportError::Io` if writing or flushing fails.
pub async fn export_to_stream<W: AsyncWrite + Unpin>(json: &str, mut writer: W) -> Result<u64> {
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(json.len() as u64)
}
