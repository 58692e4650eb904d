//! Error type for `silt-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// The store already holds rows, so offset seeding cannot be trusted.
  #[error("table {table} already contains {rows} rows; refusing to reuse this store")]
  SchemaConflict { table: &'static str, rows: i64 },

  /// Cleanup found neither a sentinel nor a real row at the offset id.
  #[error("no sentinel row at id {id} in table {table}; was the store initialized?")]
  SentinelMissing { table: &'static str, id: i64 },

  #[error("dump I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
