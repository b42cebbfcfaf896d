//! Export of query results to JSON.
//!
//! This module folds the rows of an executed query into an [`ExportResult`],
//! serializes it, and writes the JSON to files or async writers.
//!
//! # Example
//!
//! ```
//! use sqlite_json::export::{assemble, ExportResult};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), sqlite_json::ExportError> {
//! let rows = vec![
//!     json!({"name": "Adams", "id": 2}),
//!     json!({"name": "Adams", "id": 6}),
//! ];
//! let rows = rows.into_iter().map(|v| match v {
//!     serde_json::Value::Object(row) => Ok(row),
//!     _ => unreachable!(),
//! });
//!
//! let result = assemble(rows, Some("name"))?;
//! assert_eq!(result.to_json()?, r#"{"Adams":{"name":"Adams","id":6}}"#);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod json;

pub use json::{
    assemble, assemble_projected, export_to_file, export_to_stream, project, ExportResult,
};
