//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use rusqlite::Connection;
use serde_json::{json, Value};
use tempfile::TempDir;

/// The rows of the `presidents` fixture table, in insertion order.
pub const PRESIDENTS: [(&str, i64); 6] = [
    ("Washington", 1),
    ("Adams", 2),
    ("Jefferson", 3),
    ("Madison", 4),
    ("Monroe", 5),
    ("Adams", 6),
];

/// A database file holding the `presidents` table, removed on drop.
pub struct TestDatabase {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestDatabase {
    /// Path for an output file inside the fixture's temp dir.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Creates `tmp.db` with `CREATE TABLE presidents (name TEXT, id INT)` and the
/// six fixture rows.
pub fn presidents_db() -> TestDatabase {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("tmp.db");

    let conn = Connection::open(&path).expect("Failed to create database");
    conn.execute("CREATE TABLE presidents (name TEXT, id INT)", [])
        .expect("CREATE TABLE should succeed");
    {
        let mut stmt = conn
            .prepare("INSERT INTO presidents VALUES (?1, ?2)")
            .expect("prepare INSERT should succeed");
        for (name, id) in PRESIDENTS {
            stmt.execute(rusqlite::params![name, id])
                .expect("INSERT should succeed");
        }
    }

    TestDatabase { dir, path }
}

/// The fixture rows as JSON objects.
pub fn presidents_json() -> Vec<Value> {
    PRESIDENTS
        .iter()
        .map(|(name, id)| json!({"name": name, "id": id}))
        .collect()
}

/// The fixture rows keyed by name, last row winning.
pub fn presidents_by_name() -> Value {
    let mut map = serde_json::Map::new();
    for (name, id) in PRESIDENTS {
        map.insert(name.to_string(), json!({"name": name, "id": id}));
    }
    Value::Object(map)
}
