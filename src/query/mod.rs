//! Request resolution.
//!
//! The `export` module turns caller requests into the SQL statement that is
//! executed against the database.

pub mod export;

pub use export::{
    is_valid_table_name, normalize, CanonicalQuery, ExportOptions, ExportRequest, ExportSource,
    SelectQuery,
};
