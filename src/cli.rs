use std::path::PathBuf;

use clap::Parser;
use sqlite_json::ExportOptions;

#[derive(Parser, Debug)]
#[command(name = "sqlite-json", version, about = "Export SQLite tables and queries to JSON", long_about = None)]
pub struct CliOpts {
    #[arg(help = "Path to the SQLite database file")]
    pub database: PathBuf,

    #[arg(help = "SQL statement to export; takes precedence over --table and --where")]
    pub sql: Option<String>,

    #[arg(long, help = "Table to export")]
    pub table: Option<String>,

    #[arg(
        long = "where",
        value_name = "EXPR",
        help = "SQL expression used to filter --table rows"
    )]
    pub where_clause: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        value_name = "COLUMNS",
        help = "Comma-separated list of columns to export"
    )]
    pub columns: Vec<String>,

    #[arg(long, help = "Column whose value keys the output object")]
    pub key: Option<String>,

    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Write the JSON to FILE instead of standard output"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with_all = ["sql", "table", "where_clause", "columns", "key"],
        help = "Print the names of the tables in the database as a JSON array"
    )]
    pub list_tables: bool,

    #[arg(
        long,
        env = "SQLITE_JSON_LOG",
        default_value = "warn",
        help = "Log level for diagnostics on standard error (RUST_LOG takes precedence)"
    )]
    pub log_level: String,
}

impl CliOpts {
    /// Export options described by the arguments.
    ///
    /// A positional SQL statement is passed as the `sql` option, so it wins
    /// over `--table` and `--where` exactly as it does for library callers.
    pub fn export_options(&self) -> ExportOptions {
        let mut options = ExportOptions::new().columns(self.columns.iter().cloned());

        if let Some(ref sql) = self.sql {
            options = options.sql(sql.clone());
        }
        if let Some(ref table) = self.table {
            options = options.table(table.clone());
        }
        if let Some(ref expr) = self.where_clause {
            options = options.where_clause(expr.clone());
        }
        if let Some(ref key) = self.key {
            options = options.key(key.clone());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        CliOpts::command().debug_assert();
    }

    #[test]
    fn test_options_from_flags() {
        let opts = CliOpts::parse_from([
            "sqlite-json",
            "data.db",
            "--table",
            "presidents",
            "--where",
            "id == 1",
            "--columns",
            "name,id",
            "--key",
            "name",
        ]);

        let options = opts.export_options();
        assert_eq!(options.table.as_deref(), Some("presidents"));
        assert_eq!(options.where_clause.as_deref(), Some("id == 1"));
        assert_eq!(options.columns, vec!["name".to_string(), "id".to_string()]);
        assert_eq!(options.key.as_deref(), Some("name"));
        assert_eq!(options.sql, None);
    }

    #[test]
    fn test_positional_sql_becomes_sql_option() {
        let opts = CliOpts::parse_from([
            "sqlite-json",
            "data.db",
            "SELECT * FROM presidents;",
            "--where",
            "id==1",
        ]);

        let options = opts.export_options();
        assert_eq!(options.sql.as_deref(), Some("SELECT * FROM presidents;"));
        assert_eq!(options.where_clause.as_deref(), Some("id==1"));
    }

    #[test]
    fn test_list_tables_conflicts_with_table() {
        let result = CliOpts::try_parse_from([
            "sqlite-json",
            "data.db",
            "--list-tables",
            "--table",
            "presidents",
        ]);
        assert!(result.is_err());
    }
}
