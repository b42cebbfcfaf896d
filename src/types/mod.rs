//! Mapping between SQLite values and JSON values.

pub(crate) mod conversion;

pub use conversion::{key_to_string, row_to_json, value_to_json, Row};
