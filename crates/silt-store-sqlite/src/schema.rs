//! The three-table batch schema, shared by the initializer, the sentinel
//! remover, and the SQL exporter. Nothing else in the crate spells out a
//! table name or a sentinel statement.

/// Marker value carried by every text column of a sentinel row. Removal
/// matches on it, so a real row that happens to land on an offset id is
/// never deleted.
pub const SENTINEL_MARKER: &str = "__sentinel__";

/// One table of the batch schema.
pub struct TableDef {
  /// Table name, shared verbatim between the SQLite DDL and the dump.
  pub name:            &'static str,
  /// Parameterized insert for the sentinel row pinning the key sequence.
  pub sentinel_insert: &'static str,
  /// Parameterized delete matching the sentinel row by id and marker.
  pub sentinel_delete: &'static str,
}

/// Parent table: one row per ingested JSON record.
pub static ENTRIES: TableDef = TableDef {
  name:            "entries",
  sentinel_insert: "INSERT INTO entries (id, date, ip_address) VALUES (?1, ?2, ?2)",
  sentinel_delete: "DELETE FROM entries WHERE id = ?1 AND date = ?2",
};

/// Child table: one row per key/value pair of a record's secondary data.
pub static CRITERIA: TableDef = TableDef {
  name:            "criteria",
  sentinel_insert: "INSERT INTO criteria (id, entry_id, key, value) VALUES (?1, ?2, ?3, ?3)",
  sentinel_delete: "DELETE FROM criteria WHERE id = ?1 AND key = ?2",
};

/// Child table: one row per element of a record's tertiary data array.
pub static ATTRIBUTES: TableDef = TableDef {
  name:            "attributes",
  sentinel_insert: "INSERT INTO attributes (id, entry_id, value) VALUES (?1, ?2, ?3)",
  sentinel_delete: "DELETE FROM attributes WHERE id = ?1 AND value = ?2",
};

/// Parents before children, so the dump can be replayed against a live
/// database that enforces foreign keys.
pub static TABLES: [&TableDef; 3] = [&ENTRIES, &CRITERIA, &ATTRIBUTES];

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
/// `AUTOINCREMENT` keeps ids strictly increasing and never reused, even
/// after the sentinel rows are deleted.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS entries (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    date       TEXT NOT NULL,
    ip_address TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS criteria (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id INTEGER NOT NULL REFERENCES entries(id),
    key      TEXT NOT NULL,
    value    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attributes (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id INTEGER NOT NULL REFERENCES entries(id),
    value    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS criteria_entry_idx   ON criteria(entry_id);
CREATE INDEX IF NOT EXISTS attributes_entry_idx ON attributes(entry_id);

PRAGMA user_version = 1;
";
