//! The `Exporter` type: the library entry point.
//!
//! An `Exporter` is bound to one database and exposes the three operations of
//! the crate: listing tables, exporting a request to a JSON string, and saving
//! that string to a file. Each call runs exactly one query and reports its
//! outcome through the returned `Result`; there are no retries and no
//! cancellation once a query is issued.

use std::path::Path;
use std::sync::OnceLock;

use tokio::io::AsyncWrite;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::connection::{Database, DatabaseSource, ExporterOptions};
use crate::error::Result;
use crate::export::{self, ExportResult};
use crate::query::{normalize, CanonicalQuery, ExportRequest};

/// Global tokio runtime for blocking operations.
///
/// This runtime is lazily initialized on first use and is shared across
/// all blocking calls. It provides a way to call async methods from
/// synchronous code.
fn blocking_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime for blocking operations")
    })
}

/// Exports rows of a SQLite database as JSON.
///
/// # Example
///
/// ```no_run
/// use sqlite_json::{ExportOptions, Exporter};
///
/// # async fn example() -> Result<(), sqlite_json::ExportError> {
/// let exporter = Exporter::open("presidents.db");
///
/// let json = exporter
///     .json(ExportOptions::new().table("presidents").key("name"))
///     .await?;
/// println!("{json}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Exporter {
    database: Database,
}

impl Exporter {
    /// Create an exporter for a database file or an open connection.
    ///
    /// A file is not opened until the first operation.
    pub fn open(source: impl Into<DatabaseSource>) -> Self {
        Self::with_options(source, ExporterOptions::default())
    }

    /// Create an exporter with explicit open options.
    pub fn with_options(source: impl Into<DatabaseSource>, options: ExporterOptions) -> Self {
        Self {
            database: Database::new(source.into(), options),
        }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// List the user tables of the database.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Database` if the database cannot be opened or
    /// the catalog query fails.
    pub async fn tables(&self) -> Result<Vec<String>> {
        self.database.list_tables().await
    }

    /// Run a request and return the folded rows.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::InvalidRequest` for an unusable request,
    /// `ExportError::Database` if the query fails, and
    /// `ExportError::Serialization` if a value has no JSON form.
    pub async fn export(&self, request: impl Into<ExportRequest>) -> Result<ExportResult> {
        let query = normalize(request)?;
        debug!(
            path = ?self.database.path(),
            statement = %query.statement,
            key = ?query.key,
            columns = ?query.columns,
            "Resolved export request"
        );

        let CanonicalQuery {
            statement,
            key,
            columns,
        } = query;
        self.database
            .with_rows(statement, move |rows| {
                let missing: Vec<&str> = columns
                    .iter()
                    .filter(|c| !rows.columns().contains(*c))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    warn!(?missing, "Projected columns are not in the query result");
                }
                export::assemble_projected(rows, key.as_deref(), &columns)
            })
            .await
    }

    /// Run a request and return the result as a JSON string.
    ///
    /// The string is an array of row objects, or an object of row objects
    /// when the request has a key.
    ///
    /// # Errors
    ///
    /// See [`export`](Self::export).
    pub async fn json(&self, request: impl Into<ExportRequest>) -> Result<String> {
        self.export(request).await?.to_json()
    }

    /// Run a request and write the JSON string to a file.
    ///
    /// The file is overwritten; parent directories must exist.
    ///
    /// # Returns
    ///
    /// The JSON string that was written.
    ///
    /// # Errors
    ///
    /// See [`export`](Self::export); additionally `ExportError::Io` if the
    /// file cannot be written.
    pub async fn save(
        &self,
        request: impl Into<ExportRequest>,
        file_path: impl AsRef<Path>,
    ) -> Result<String> {
        let json = self.json(request).await?;
        export::export_to_file(&json, file_path.as_ref()).await?;
        Ok(json)
    }

    /// Run a request and write the JSON string to an async writer.
    ///
    /// # Returns
    ///
    /// The JSON string that was written.
    pub async fn save_to_stream<W>(&self, request: impl Into<ExportRequest>, writer: W) -> Result<String>
    where
        W: AsyncWrite + Unpin,
    {
        let json = self.json(request).await?;
        export::export_to_stream(&json, writer).await?;
        Ok(json)
    }

    // ========================================================================
    // Blocking Wrappers
    // ========================================================================

    /// List the user tables (blocking).
    ///
    /// This is a synchronous wrapper around [`tables`](Self::tables) for use
    /// in non-async contexts. It must not be called from within a tokio
    /// runtime.
    pub fn blocking_tables(&self) -> Result<Vec<String>> {
        blocking_runtime().block_on(self.tables())
    }

    /// Run a request and return the JSON string (blocking).
    ///
    /// This is a synchronous wrapper around [`json`](Self::json).
    pub fn blocking_json(&self, request: impl Into<ExportRequest>) -> Result<String> {
        blocking_runtime().block_on(self.json(request))
    }

    /// Run a request and write the JSON string to a file (blocking).
    ///
    /// This is a synchronous wrapper around [`save`](Self::save).
    pub fn blocking_save(
        &self,
        request: impl Into<ExportRequest>,
        file_path: impl AsRef<Path>,
    ) -> Result<String> {
        blocking_runtime().block_on(self.save(request, file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::query::ExportOptions;
    use rusqlite::Connection;

    fn exporter() -> Exporter {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE presidents (name TEXT, id INT);
             INSERT INTO presidents VALUES ('Washington', 1), ('Adams', 2), ('Adams', 6);",
        )
        .unwrap();
        Exporter::open(conn)
    }

    #[test]
    fn test_open_path_is_lazy() {
        let exporter = Exporter::open("tmp/foo.db");
        assert!(!exporter.database().is_open());
    }

    #[tokio::test]
    async fn test_export_returns_structured_result() {
        let result = exporter()
            .export(ExportOptions::new().table("presidents").key("name"))
            .await
            .unwrap();
        assert!(result.is_keyed());
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_request_runs_no_query() {
        let exporter = Exporter::open("does/not/exist.db");
        let err = exporter.json(ExportOptions::new()).await.unwrap_err();
        assert!(matches!(err, ExportError::InvalidRequest(_)));
        assert!(!exporter.database().is_open());
    }

    #[tokio::test]
    async fn test_save_to_stream_writes_json() {
        let mut buffer = Vec::new();
        let json = exporter()
            .save_to_stream("SELECT id FROM presidents WHERE id = 1", &mut buffer)
            .await
            .unwrap();
        assert_eq!(json, r#"[{"id":1}]"#);
        assert_eq!(buffer, json.as_bytes());
    }

    #[tokio::test]
    async fn test_sql_option_projects_columns() {
        let json = exporter()
            .json(
                ExportOptions::new()
                    .sql("SELECT * FROM presidents WHERE id = 1")
                    .columns(["name"]),
            )
            .await
            .unwrap();
        assert_eq!(json, r#"[{"name":"Washington"}]"#);
    }

    #[test]
    fn test_blocking_runtime_exists() {
        let runtime = blocking_runtime();
        let _ = runtime.handle();
    }

    #[test]
    fn test_blocking_json() {
        let json = exporter()
            .blocking_json(ExportRequest::table("presidents"))
            .unwrap();
        assert_eq!(
            json,
            r#"[{"name":"Washington","id":1},{"name":"Adams","id":2},{"name":"Adams","id":6}]"#
        );
    }
}
