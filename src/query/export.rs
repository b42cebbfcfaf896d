//! Request resolution for JSON exports.
//!
//! An export can be requested as a raw SQL string, a bare table name, or a
//! structured [`ExportOptions`] value. [`normalize`] resolves any of these into
//! a [`CanonicalQuery`]: the SQL text to execute, the optional key column
//! used to fold rows into an object and any projection left to apply to rows.
//!
//! Precedence, highest first:
//! 1. a raw SQL request is executed as given;
//! 2. a non-empty `sql` option is executed as given and `where` is ignored;
//! 3. otherwise `SELECT <columns or *> FROM <table> [WHERE <where>]` is built.
//!
//! The key column is never written into SQL text, except that a built
//! statement whose `columns` projection lacks it selects it as well.
//!
//! A built statement carries `columns` in its `SELECT` list. Explicit SQL is
//! never rewritten, so its `columns` are applied to the rows after the query.

use crate::error::{ExportError, Result};

/// Structured export options.
///
/// `where_clause` and `sql` are passed through verbatim; no escaping or
/// parameterization is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Table to export. Required unless `sql` is set.
    pub table: Option<String>,

    /// Raw SQL statement. Overrides `table` and `where_clause`.
    pub sql: Option<String>,

    /// SQL boolean expression appended as a `WHERE` clause to built statements.
    pub where_clause: Option<String>,

    /// Columns to select (empty means all columns).
    pub columns: Vec<String>,

    /// Column whose value keys the output object.
    pub key: Option<String>,
}

impl ExportOptions {
    /// Creates empty export options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the table to export.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets a raw SQL statement, which takes precedence over `table` and `where`.
    #[must_use]
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Sets the `WHERE` expression for built statements.
    #[must_use]
    pub fn where_clause(mut self, expr: impl Into<String>) -> Self {
        self.where_clause = Some(expr.into());
        self
    }

    /// Sets the column projection.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the key column for keyed output.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// What the caller asked to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportRequest {
    /// A complete SQL statement.
    Sql(String),
    /// Every row and column of a table.
    Table(String),
    /// Structured options.
    Options(ExportOptions),
}

impl ExportRequest {
    /// Request for a complete SQL statement.
    pub fn sql(sql: impl Into<String>) -> Self {
        ExportRequest::Sql(sql.into())
    }

    /// Request for a whole table.
    pub fn table(name: impl Into<String>) -> Self {
        ExportRequest::Table(name.into())
    }
}

/// A bare string is taken as SQL, the same way a string request is.
impl From<&str> for ExportRequest {
    fn from(sql: &str) -> Self {
        ExportRequest::Sql(sql.to_string())
    }
}

impl From<String> for ExportRequest {
    fn from(sql: String) -> Self {
        ExportRequest::Sql(sql)
    }
}

impl From<ExportOptions> for ExportRequest {
    fn from(options: ExportOptions) -> Self {
        ExportRequest::Options(options)
    }
}

/// Source of the rows after request resolution: a table or a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSource {
    /// Select from a table.
    Table {
        /// Table name, optionally schema-qualified.
        name: String,
        /// Columns to select (empty means all columns).
        columns: Vec<String>,
        /// `WHERE` expression (optional).
        filter: Option<String>,
    },
    /// Run a caller-supplied statement.
    Query {
        /// SQL statement.
        sql: String,
        /// Fields to keep from each result row (empty means all).
        columns: Vec<String>,
    },
}

/// The statement to execute and the key to fold its rows by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalQuery {
    /// Fully formed SQL statement.
    pub statement: String,
    /// Key column for keyed output.
    pub key: Option<String>,
    /// Fields to keep from each row after execution (empty means all).
    ///
    /// Only set for explicit SQL; a built statement projects in SQL instead.
    pub columns: Vec<String>,
}

/// Builder for `SELECT` statements over a single table.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    /// Table name, optionally schema-qualified.
    table: String,
    /// Projection (empty means `*`).
    columns: Vec<String>,
    /// `WHERE` expression (optional).
    filter: Option<String>,
}

impl SelectQuery {
    /// Create a select query over a table.
    ///
    /// # Arguments
    ///
    /// * `table` - The name of the table to select from.
    pub fn from_table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filter: None,
        }
    }

    /// Set the columns to select.
    ///
    /// # Arguments
    ///
    /// * `cols` - The column names to select.
    pub fn columns(mut self, cols: Vec<&str>) -> Self {
        self.columns = cols.into_iter().map(String::from).collect();
        self
    }

    /// Add a column to the projection unless it is already selected.
    ///
    /// Has no effect on a `*` projection, which selects every column anyway.
    pub fn ensure_column(mut self, col: &str) -> Self {
        if !self.columns.is_empty() && !self.columns.iter().any(|c| c == col) {
            self.columns.push(col.to_string());
        }
        self
    }

    /// Set the `WHERE` expression.
    pub fn filter(mut self, expr: &str) -> Self {
        self.filter = Some(expr.to_string());
        self
    }

    /// Build the SELECT SQL statement.
    pub fn build(&self) -> String {
        let mut sql = String::from("SELECT ");

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        if let Some(ref filter) = self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }

        sql
    }
}

/// Resolves a request into the statement to execute and its key column.
///
/// # Errors
///
/// Returns `ExportError::InvalidRequest` if neither SQL nor a table is given,
/// if the table name is not a valid identifier, or if a column entry is blank.
pub fn normalize(request: impl Into<ExportRequest>) -> Result<CanonicalQuery> {
    let (source, key) = resolve_source(request.into())?;

    let (statement, columns) = match source {
        ExportSource::Query { sql, columns } => (sql, columns),
        ExportSource::Table {
            name,
            columns,
            filter,
        } => {
            let mut builder =
                SelectQuery::from_table(&name).columns(columns.iter().map(String::as_str).collect());
            if let Some(ref k) = key {
                builder = builder.ensure_column(k);
            }
            if let Some(ref f) = filter {
                builder = builder.filter(f);
            }
            (builder.build(), Vec::new())
        }
    };

    Ok(CanonicalQuery {
        statement,
        key,
        columns,
    })
}

/// Resolves a request into its row source and key column.
pub fn resolve_source(request: ExportRequest) -> Result<(ExportSource, Option<String>)> {
    match request {
        ExportRequest::Sql(sql) => {
            let sql = present(Some(sql))
                .ok_or_else(|| ExportError::invalid_request("SQL statement is empty"))?;
            Ok((
                ExportSource::Query {
                    sql,
                    columns: Vec::new(),
                },
                None,
            ))
        }
        ExportRequest::Table(name) => {
            resolve_source(ExportRequest::Options(ExportOptions::new().table(name)))
        }
        ExportRequest::Options(options) => {
            let key = present(options.key).map(|k| k.trim().to_string());
            let columns = clean_columns(options.columns)?;

            if let Some(sql) = present(options.sql) {
                return Ok((ExportSource::Query { sql, columns }, key));
            }

            let name = present(options.table).ok_or_else(|| {
                ExportError::invalid_request("either `table` or `sql` must be given")
            })?;
            let name = name.trim().to_string();
            if !is_valid_table_name(&name) {
                return Err(ExportError::invalid_request(format!(
                    "`{name}` is not a valid table name"
                )));
            }

            Ok((
                ExportSource::Table {
                    name,
                    columns,
                    filter: present(options.where_clause),
                },
                key,
            ))
        }
    }
}

/// Checks a table name: one identifier, or `schema.table`.
///
/// Each part starts with an ASCII letter or underscore, followed by ASCII
/// letters, digits, underscores or `$`.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2 && parts.iter().all(|p| is_identifier(p))
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn clean_columns(columns: Vec<String>) -> Result<Vec<String>> {
    columns
        .into_iter()
        .map(|column| {
            let column = column.trim();
            if column.is_empty() {
                Err(ExportError::invalid_request("column names must not be empty"))
            } else {
                Ok(column.to_string())
            }
        })
        .collect()
}

/// Blank strings count as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
