//! [`SqliteStore`] — the SQLite implementation of [`LogStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use silt_core::{
  record::LogRecord,
  store::{KeyOffsets, LogStore},
};

use crate::{
  Error, Result,
  schema::{self, SENTINEL_MARKER, TableDef},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A batch store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// What [`SqliteStore::remove_sentinels`] found at one table's offset id.
enum SentinelOutcome {
  Removed,
  OffsetOccupied,
  Missing,
}

impl SqliteStore {
  /// Open (or create) a store at `path`. Schema creation happens in
  /// [`LogStore::init_schema`], not here, because table creation and key
  /// seeding belong to the same step.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  /// Row count of `table`.
  pub async fn row_count(&self, table: &'static str) -> Result<i64> {
    let count = self
      .conn
      .call(move |conn| {
        let count: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM {table}"),
          [],
          |row| row.get(0),
        )?;
        Ok(count)
      })
      .await?;
    Ok(count)
  }

  /// Delete one table's sentinel row, reporting what was found at the
  /// offset id.
  async fn remove_sentinel(
    &self,
    table: &'static TableDef,
    offset: i64,
  ) -> Result<SentinelOutcome> {
    let outcome = self
      .conn
      .call(move |conn| {
        let removed = conn.execute(
          table.sentinel_delete,
          rusqlite::params![offset, SENTINEL_MARKER],
        )?;
        if removed > 0 {
          return Ok(SentinelOutcome::Removed);
        }

        let occupied: bool = conn
          .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", table.name),
            rusqlite::params![offset],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        Ok(if occupied {
          SentinelOutcome::OffsetOccupied
        } else {
          SentinelOutcome::Missing
        })
      })
      .await?;
    Ok(outcome)
  }
}

// ─── LogStore impl ───────────────────────────────────────────────────────────

impl LogStore for SqliteStore {
  type Error = Error;

  async fn init_schema(&self, offsets: KeyOffsets) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(schema::SCHEMA)?;
        Ok(())
      })
      .await?;

    for table in schema::TABLES {
      let rows = self.row_count(table.name).await?;
      if rows > 0 {
        return Err(Error::SchemaConflict { table: table.name, rows });
      }
    }

    // Seed each key sequence: the sentinel takes the offset id itself, so
    // the first real row lands at offset + 1. The child sentinels point at
    // the entries sentinel to satisfy the foreign keys.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          schema::ENTRIES.sentinel_insert,
          rusqlite::params![offsets.entries, SENTINEL_MARKER],
        )?;
        tx.execute(
          schema::CRITERIA.sentinel_insert,
          rusqlite::params![offsets.criteria, offsets.entries, SENTINEL_MARKER],
        )?;
        tx.execute(
          schema::ATTRIBUTES.sentinel_insert,
          rusqlite::params![
            offsets.attributes,
            offsets.entries,
            SENTINEL_MARKER
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn insert_record(&self, record: LogRecord) -> Result<i64> {
    let entry_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO entries (date, ip_address) VALUES (?1, ?2)",
          rusqlite::params![record.date, record.ip_address],
        )?;
        let entry_id = tx.last_insert_rowid();

        {
          let mut stmt = tx.prepare(
            "INSERT INTO criteria (entry_id, key, value) VALUES (?1, ?2, ?3)",
          )?;
          for criterion in &record.criteria {
            stmt.execute(rusqlite::params![
              entry_id,
              criterion.key,
              criterion.value
            ])?;
          }
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO attributes (entry_id, value) VALUES (?1, ?2)",
          )?;
          for value in &record.attributes {
            stmt.execute(rusqlite::params![entry_id, value])?;
          }
        }

        tx.commit()?;
        Ok(entry_id)
      })
      .await?;

    Ok(entry_id)
  }

  async fn remove_sentinels(&self, offsets: KeyOffsets) -> Result<()> {
    // Children first, so the entries sentinel is unreferenced when it goes.
    let order = [
      (&schema::CRITERIA, offsets.criteria),
      (&schema::ATTRIBUTES, offsets.attributes),
      (&schema::ENTRIES, offsets.entries),
    ];

    for (table, offset) in order {
      match self.remove_sentinel(table, offset).await? {
        SentinelOutcome::Removed => {}
        SentinelOutcome::OffsetOccupied => {
          tracing::warn!(
            table = table.name,
            id = offset,
            "offset id holds a real row, not a sentinel; leaving it in place"
          );
        }
        SentinelOutcome::Missing => {
          return Err(Error::SentinelMissing { table: table.name, id: offset });
        }
      }
    }

    Ok(())
  }
}
