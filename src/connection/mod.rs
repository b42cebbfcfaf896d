//! SQLite database handles.
//!
//! A [`Database`] wraps one `rusqlite::Connection`. When built from a file
//! path the connection is opened on first use, so constructing an exporter
//! for a missing file succeeds and the failure surfaces on the first query.
//!
//! `rusqlite::Connection` is not `Sync`, so access goes through a mutex, and
//! every query runs on tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::types::{row_to_json, Row};

/// Catalog query listing user tables in catalog order.
const LIST_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'";

/// Default busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

type SharedConnection = Arc<Mutex<Connection>>;

/// Where the rows come from.
#[derive(Debug)]
pub enum DatabaseSource {
    /// A database file, opened on first use.
    Path(PathBuf),
    /// A private in-memory database, created on first use.
    InMemory,
    /// An already open connection.
    Connection(Connection),
}

impl From<&str> for DatabaseSource {
    fn from(path: &str) -> Self {
        DatabaseSource::Path(PathBuf::from(path))
    }
}

impl From<String> for DatabaseSource {
    fn from(path: String) -> Self {
        DatabaseSource::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for DatabaseSource {
    fn from(path: PathBuf) -> Self {
        DatabaseSource::Path(path)
    }
}

impl From<&Path> for DatabaseSource {
    fn from(path: &Path) -> Self {
        DatabaseSource::Path(path.to_path_buf())
    }
}

impl From<Connection> for DatabaseSource {
    fn from(conn: Connection) -> Self {
        DatabaseSource::Connection(conn)
    }
}

/// Options for opening database files.
///
/// They apply only when the exporter opens the database itself; a
/// [`DatabaseSource::Connection`] is used as configured by the caller.
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    /// Open the file read-only (default: true).
    pub read_only: bool,

    /// How long to wait on a locked database, in milliseconds (default: 5000).
    pub busy_timeout_ms: u64,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            read_only: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl ExporterOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the database file is opened read-only.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets the busy timeout in milliseconds.
    #[must_use]
    pub fn busy_timeout_ms(mut self, timeout: u64) -> Self {
        self.busy_timeout_ms = timeout;
        self
    }

    fn open_flags(&self) -> OpenFlags {
        if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        }
    }
}

/// Lazily opened handle to a SQLite database.
pub struct Database {
    /// File to open on first use; `None` for in-memory or caller-provided connections.
    path: Option<PathBuf>,
    options: ExporterOptions,
    conn: OnceCell<SharedConnection>,
}

impl Database {
    /// Creates a handle; nothing is opened yet for path and in-memory sources.
    pub fn new(source: DatabaseSource, options: ExporterOptions) -> Self {
        match source {
            DatabaseSource::Path(path) => Self {
                path: Some(path),
                options,
                conn: OnceCell::new(),
            },
            DatabaseSource::InMemory => Self {
                path: None,
                options,
                conn: OnceCell::new(),
            },
            DatabaseSource::Connection(conn) => Self {
                path: None,
                options,
                conn: OnceCell::new_with(Some(Arc::new(Mutex::new(conn)))),
            },
        }
    }

    /// The database file path, if the handle was built from one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true once the underlying connection exists.
    pub fn is_open(&self) -> bool {
        self.conn.initialized()
    }

    /// Runs `sql` and hands the row cursor to `f` on the blocking pool.
    ///
    /// The connection stays locked until `f` returns, so `f` should consume
    /// the rows it needs and return.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Database` if opening, preparing or executing the
    /// statement fails, and whatever `f` returns.
    pub async fn with_rows<F, R>(&self, sql: String, f: F) -> Result<R>
    where
        F: for<'stmt> FnOnce(RowStream<'stmt>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.connection().await?;

        run_blocking(move || {
            let conn = conn.lock();
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            debug!(sql = %sql, columns = columns.len(), "Executing statement");

            let rows = stmt.query([])?;
            f(RowStream { rows, columns })
        })
        .await
    }

    /// Lists user tables, excluding SQLite's internal `sqlite_*` tables.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Database` if the catalog query fails.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.connection().await?;

        run_blocking(move || {
            let conn = conn.lock();
            let mut stmt = conn.prepare(LIST_TABLES_SQL)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        })
        .await
    }

    /// Returns the connection, opening it on first use.
    async fn connection(&self) -> Result<SharedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let options = self.options.clone();
                run_blocking(move || open_connection(path.as_deref(), &options)).await
            })
            .await?;
        Ok(Arc::clone(conn))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("read_only", &self.options.read_only)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Cursor over the rows of an executing statement, converted to JSON rows.
pub struct RowStream<'stmt> {
    rows: rusqlite::Rows<'stmt>,
    columns: Vec<String>,
}

impl RowStream<'_> {
    /// Column names of the statement, in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Iterator for RowStream<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next() {
            Ok(Some(row)) => Some(row_to_json(row, &self.columns)),
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

fn open_connection(path: Option<&Path>, options: &ExporterOptions) -> Result<SharedConnection> {
    let conn = match path {
        Some(path) => {
            debug!(path = %path.display(), read_only = options.read_only, "Opening database");
            Connection::open_with_flags(path, options.open_flags())?
        }
        None => Connection::open_in_memory()?,
    };
    conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
    Ok(Arc::new(Mutex::new(conn)))
}

async fn run_blocking<F, R>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExportError::TaskFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE presidents (name TEXT, id INT);
             INSERT INTO presidents VALUES ('Washington', 1), ('Adams', 2);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_source_conversions() {
        assert!(matches!(DatabaseSource::from("a.db"), DatabaseSource::Path(_)));
        assert!(matches!(
            DatabaseSource::from(PathBuf::from("a.db")),
            DatabaseSource::Path(_)
        ));
        assert!(matches!(
            DatabaseSource::from(Connection::open_in_memory().unwrap()),
            DatabaseSource::Connection(_)
        ));
    }

    #[test]
    fn test_default_options() {
        let options = ExporterOptions::default();
        assert!(options.read_only);
        assert_eq!(options.busy_timeout_ms, 5_000);

        let options = ExporterOptions::new().read_only(false).busy_timeout_ms(10);
        assert!(!options.read_only);
        assert_eq!(options.busy_timeout_ms, 10);
    }

    #[test]
    fn test_path_source_is_lazy() {
        let db = Database::new("does/not/exist.db".into(), ExporterOptions::default());
        assert!(!db.is_open());
        assert_eq!(db.path(), Some(Path::new("does/not/exist.db")));
    }

    #[tokio::test]
    async fn test_missing_file_fails_on_first_use() {
        let db = Database::new("does/not/exist.db".into(), ExporterOptions::default());
        let err = db.list_tables().await.unwrap_err();
        assert!(matches!(err, ExportError::Database(_)));
        assert!(!db.is_open());
    }

    #[tokio::test]
    async fn test_list_tables_excludes_internal_tables() {
        let conn = seeded_connection();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .unwrap();
        let db = Database::new(conn.into(), ExporterOptions::default());

        let tables = db.list_tables().await.unwrap();
        assert_eq!(tables, vec!["presidents".to_string(), "t".to_string()]);
    }

    #[tokio::test]
    async fn test_with_rows_streams_json_rows() {
        let db = Database::new(seeded_connection().into(), ExporterOptions::default());

        let (columns, rows) = db
            .with_rows("SELECT * FROM presidents".to_string(), |stream| {
                let columns = stream.columns().to_vec();
                let rows = stream.collect::<Result<Vec<_>>>()?;
                Ok((columns, rows))
            })
            .await
            .unwrap();

        assert_eq!(columns, vec!["name".to_string(), "id".to_string()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["name"], "Adams");
        assert_eq!(rows[1]["id"], 2);
    }

    #[tokio::test]
    async fn test_with_rows_reports_sql_errors() {
        let db = Database::new(DatabaseSource::InMemory, ExporterOptions::default());
        let err = db
            .with_rows("NOT VALID SQL AT ALL".to_string(), |stream| Ok(stream.count()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Database(_)));
    }

    #[tokio::test]
    async fn test_in_memory_source_opens_lazily() {
        let db = Database::new(DatabaseSource::InMemory, ExporterOptions::default());
        assert!(!db.is_open());
        assert!(db.list_tables().await.unwrap().is_empty());
        assert!(db.is_open());
    }
}
