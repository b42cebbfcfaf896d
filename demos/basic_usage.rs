//! Basic usage example for sqlite-json.
//!
//! Builds a small in-memory database, then exports it a few different ways:
//! a whole table, a filtered projection, a keyed object and a raw query saved
//! to a file.

use rusqlite::Connection;
use sqlite_json::{ExportOptions, Exporter};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("=== sqlite-json Basic Usage Example ===\n");

    // 1. Seed a database
    println!("1. Creating the presidents table...");
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(
        "CREATE TABLE presidents (name TEXT, id INT);
         INSERT INTO presidents VALUES
            ('Washington', 1), ('Adams', 2), ('Jefferson', 3),
            ('Madison', 4), ('Monroe', 5), ('Adams', 6);",
    )?;
    let exporter = Exporter::open(conn);
    println!("   Tables: {:?}\n", exporter.tables().await?);

    // 2. Whole table
    println!("2. Exporting the whole table...");
    let json = exporter
        .json(ExportOptions::new().table("presidents"))
        .await?;
    println!("   {json}\n");

    // 3. Columns and a filter
    println!("3. Exporting names with id < 3...");
    let json = exporter
        .json(
            ExportOptions::new()
                .table("presidents")
                .columns(["name"])
                .where_clause("id < 3"),
        )
        .await?;
    println!("   {json}\n");

    // 4. Keyed by name; the later Adams replaces the earlier one
    println!("4. Exporting keyed by name...");
    let json = exporter
        .json(ExportOptions::new().table("presidents").key("name"))
        .await?;
    println!("   {json}\n");

    // 5. Raw SQL saved to a file
    let path = std::env::temp_dir().join("sqlite-json-presidents.json");
    println!("5. Saving a query to {}...", path.display());
    let json = exporter
        .save("SELECT id FROM presidents WHERE name = 'Adams'", &path)
        .await?;
    println!("   Wrote {} bytes: {json}\n", json.len());

    println!("=== Example completed ===");
    Ok(())
}
