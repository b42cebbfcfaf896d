//! # sqlite-json
//!
//! Export SQLite tables and query results to JSON.
//!
//! Rows are read from a table or from an arbitrary query, optionally narrowed
//! by a column list and a `WHERE` expression, and serialized either as an
//! array of row objects or as an object keyed by one column's value. The JSON
//! can be returned in memory or written to a file.
//!
//! ## Features
//!
//! - **Table or SQL**: export a whole table, a filtered projection of it, or
//!   the result of any statement
//! - **Keyed output**: fold rows into an object by a column value
//! - **Lazy open**: an exporter built from a path opens the file on first use
//! - **Async and blocking APIs**: every operation has a `blocking_*` twin
//!
//! ## Example
//!
//! ```no_run
//! use sqlite_json::{ExportOptions, Exporter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = Exporter::open("data.db");
//!
//! // List tables
//! for table in exporter.tables().await? {
//!     println!("{table}");
//! }
//!
//! // Whole table as an array
//! let json = exporter.json(ExportOptions::new().table("presidents")).await?;
//!
//! // Filtered projection keyed by name
//! let json = exporter
//!     .json(
//!         ExportOptions::new()
//!             .table("presidents")
//!             .columns(["name"])
//!             .where_clause("id == 1")
//!             .key("name"),
//!     )
//!     .await?;
//! assert_eq!(json, r#"{"Washington":{"name":"Washington"}}"#);
//!
//! // Raw SQL, saved to a file
//! exporter
//!     .save("SELECT name FROM presidents", "names.json")
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod connection;
pub mod error;
pub mod export;
pub mod exporter;
pub mod query;
pub mod types;

// =============================================================================
// Exporter
// =============================================================================

/// Re-export the exporter and database handle types.
pub use connection::{Database, DatabaseSource, ExporterOptions, RowStream};
pub use exporter::Exporter;

// =============================================================================
// Error Types
// =============================================================================

/// Re-export error types for convenient error handling.
pub use error::{ExportError, Result};

// =============================================================================
// Request Types
// =============================================================================

/// Request types and the resolver that turns them into SQL.
pub use query::{normalize, CanonicalQuery, ExportOptions, ExportRequest, ExportSource};

// =============================================================================
// Export Types
// =============================================================================

/// Row folding and output functions.
pub use export::{
    assemble, assemble_projected, export_to_file, export_to_stream, project, ExportResult,
};

/// JSON row type.
pub use types::Row;
