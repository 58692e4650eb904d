//! The `LogStore` trait and key-offset configuration.
//!
//! The trait is implemented by storage backends (e.g. `silt-store-sqlite`).
//! The ingest walker depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::record::LogRecord;

// ─── Offsets ─────────────────────────────────────────────────────────────────

/// Starting id for each table's key sequence, named after the table it
/// seeds. Choosing values above a live database's highest ids lets the
/// finished batch be appended without primary-key collisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyOffsets {
  pub entries:    i64,
  pub criteria:   i64,
  pub attributes: i64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the batch store a run writes into.
///
/// Rows are only ever created, never mutated. The three methods correspond to
/// the three phases that touch the store, and callers invoke them strictly in
/// this order: `init_schema`, then any number of `insert_record` calls, then
/// `remove_sentinels`.
pub trait LogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create the schema and pin each table's next auto-assigned key to
  /// `offset + 1` by inserting a sentinel row at the offset itself.
  ///
  /// Fails if the store already holds rows, since offset seeding cannot be
  /// trusted on a populated store.
  fn init_schema(
    &self,
    offsets: KeyOffsets,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Atomically insert one record's full row set — the parent row and every
  /// child row linked to it. Returns the id assigned to the parent.
  fn insert_record(
    &self,
    record: LogRecord,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Delete the sentinel rows inserted by
  /// [`init_schema`](LogStore::init_schema), leaving only real data.
  fn remove_sentinels(
    &self,
    offsets: KeyOffsets,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
