//! Conversion of SQLite values into JSON values.
//!
//! SQLite stores every value in one of five storage classes. Four of them map
//! directly onto JSON scalars; BLOBs have no JSON representation and are
//! rejected. Real values that are not finite (SQLite can produce them from
//! arithmetic such as `1e308 * 10`) are rejected as well.

use rusqlite::types::ValueRef;
use serde_json::{Map, Number, Value};

use crate::error::{ExportError, Result};

/// A single result record: column name to JSON scalar, in result column order.
pub type Row = Map<String, Value>;

/// Converts one SQLite value into a JSON value.
///
/// # Arguments
/// * `column` - Name of the column the value came from, used in error messages
/// * `value` - The borrowed SQLite value
///
/// # Errors
/// Returns `ExportError::Serialization` for BLOBs, non-finite reals and text
/// that is not valid UTF-8.
pub fn value_to_json(column: &str, value: ValueRef<'_>) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(n) => Ok(Value::from(n)),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).ok_or_else(|| {
            ExportError::serialization(column, format!("non-finite real value {f}"))
        }),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| ExportError::serialization(column, format!("invalid UTF-8 text: {e}"))),
        ValueRef::Blob(bytes) => Err(ExportError::serialization(
            column,
            format!("BLOB values ({} bytes) cannot be represented in JSON", bytes.len()),
        )),
    }
}

/// Converts a result record into a [`Row`].
///
/// `columns` must hold the statement's column names in result order.
pub fn row_to_json(row: &rusqlite::Row<'_>, columns: &[String]) -> Result<Row> {
    let mut out = Map::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let value = value_to_json(column, row.get_ref(idx)?)?;
        out.insert(column.clone(), value);
    }
    Ok(out)
}

/// Renders a column value as an object key.
///
/// Strings are used verbatim. Numbers follow JavaScript's `String(n)`: an
/// integral real prints without a fraction, so `2.0` and `2` produce the same
/// key, and reals with magnitude at or above `1e21` or below `1e-6` use
/// exponent form (`1e+21`, `1.5e-7`). Booleans and null print as `true`,
/// `false` and `null`.
pub fn key_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() => real_to_key(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn real_to_key(f: f64) -> String {
    if f == 0.0 {
        // -0 also prints as "0"
        return "0".to_string();
    }
    if f.abs() >= 1e21 || f.abs() < 1e-6 {
        let exp = format!("{f:e}");
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        };
    }
    if f.fract() == 0.0 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}
