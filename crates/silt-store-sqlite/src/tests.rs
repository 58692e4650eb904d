//! Integration tests for `SqliteStore` against in-memory and tempfile-backed
//! databases, including full init → ingest → cleanup → dump runs.

use std::{fs::File, io::Write, path::Path};

use flate2::{Compression, write::GzEncoder};
use silt_core::{
  ingest::ingest_dir,
  record::{Criterion, LogRecord},
  store::{KeyOffsets, LogStore},
};

use crate::{Error, SqliteStore, dump_path};

const SAMPLE_LINE: &str = r#"{"date":"2024-01-01","ipAddress":"10.0.0.1","secondaryData":[{"k1":"v1"}],"tertiaryData":["x"]}"#;

fn sample_record() -> LogRecord {
  LogRecord {
    date:       "2024-01-01".into(),
    ip_address: "10.0.0.1".into(),
    criteria:   vec![Criterion { key: "k1".into(), value: "v1".into() }],
    attributes: vec!["x".into()],
  }
}

async fn store_with(offsets: KeyOffsets) -> SqliteStore {
  let s = SqliteStore::open_in_memory().await.expect("in-memory store");
  s.init_schema(offsets).await.expect("schema");
  s
}

async fn ids(s: &SqliteStore, table: &'static str) -> Vec<i64> {
  s.conn
    .call(move |conn| {
      let mut stmt =
        conn.prepare(&format!("SELECT id FROM {table} ORDER BY id"))?;
      let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
      Ok(ids)
    })
    .await
    .unwrap()
}

async fn entry_ids(s: &SqliteStore, table: &'static str) -> Vec<i64> {
  s.conn
    .call(move |conn| {
      let mut stmt =
        conn.prepare(&format!("SELECT entry_id FROM {table} ORDER BY id"))?;
      let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
      Ok(ids)
    })
    .await
    .unwrap()
}

fn write_gz(path: &Path, lines: &[&str]) {
  let file = File::create(path).unwrap();
  let mut encoder = GzEncoder::new(file, Compression::default());
  for line in lines {
    writeln!(encoder, "{line}").unwrap();
  }
  encoder.finish().unwrap();
}

// ─── Schema initialization ───────────────────────────────────────────────────

#[tokio::test]
async fn init_seeds_each_table_with_one_sentinel() {
  let s = store_with(KeyOffsets::default()).await;

  assert_eq!(s.row_count("entries").await.unwrap(), 1);
  assert_eq!(s.row_count("criteria").await.unwrap(), 1);
  assert_eq!(s.row_count("attributes").await.unwrap(), 1);
  assert_eq!(ids(&s, "entries").await, vec![0]);
}

#[tokio::test]
async fn init_refuses_populated_store() {
  let s = store_with(KeyOffsets::default()).await;

  let err = s.init_schema(KeyOffsets::default()).await.unwrap_err();
  assert!(matches!(err, Error::SchemaConflict { table: "entries", .. }));
}

#[tokio::test]
async fn first_real_ids_start_at_offset_plus_one() {
  let offsets =
    KeyOffsets { entries: 100, criteria: 200, attributes: 300 };
  let s = store_with(offsets).await;

  let entry_id = s.insert_record(sample_record()).await.unwrap();
  assert_eq!(entry_id, 101);

  assert_eq!(ids(&s, "criteria").await, vec![200, 201]);
  assert_eq!(ids(&s, "attributes").await, vec![300, 301]);
  assert_eq!(entry_ids(&s, "criteria").await, vec![100, 101]);
  assert_eq!(entry_ids(&s, "attributes").await, vec![100, 101]);
}

// ─── Record insertion ────────────────────────────────────────────────────────

#[tokio::test]
async fn children_link_to_their_own_parent() {
  let s = store_with(KeyOffsets::default()).await;

  let first = s.insert_record(sample_record()).await.unwrap();
  let mut second_record = sample_record();
  second_record.ip_address = "10.0.0.2".into();
  second_record.criteria.push(Criterion {
    key:   "k2".into(),
    value: "v2".into(),
  });
  let second = s.insert_record(second_record).await.unwrap();

  assert_eq!((first, second), (1, 2));
  assert_eq!(entry_ids(&s, "criteria").await, vec![0, 1, 2, 2]);
  assert_eq!(entry_ids(&s, "attributes").await, vec![0, 1, 2]);
}

#[tokio::test]
async fn record_without_children_inserts_parent_only() {
  let s = store_with(KeyOffsets::default()).await;

  let record = LogRecord {
    date:       "2024-01-01".into(),
    ip_address: "10.0.0.1".into(),
    criteria:   vec![],
    attributes: vec![],
  };
  s.insert_record(record).await.unwrap();

  assert_eq!(s.row_count("entries").await.unwrap(), 2);
  assert_eq!(s.row_count("criteria").await.unwrap(), 1);
  assert_eq!(s.row_count("attributes").await.unwrap(), 1);
}

// ─── Sentinel removal ────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_sentinels_leaves_only_real_rows() {
  let offsets = KeyOffsets::default();
  let s = store_with(offsets).await;
  s.insert_record(sample_record()).await.unwrap();

  s.remove_sentinels(offsets).await.unwrap();

  assert_eq!(ids(&s, "entries").await, vec![1]);
  assert_eq!(ids(&s, "criteria").await, vec![1]);
  assert_eq!(ids(&s, "attributes").await, vec![1]);
}

#[tokio::test]
async fn remove_sentinels_twice_errors() {
  let offsets = KeyOffsets::default();
  let s = store_with(offsets).await;

  s.remove_sentinels(offsets).await.unwrap();
  let err = s.remove_sentinels(offsets).await.unwrap_err();
  assert!(matches!(err, Error::SentinelMissing { .. }));
}

#[tokio::test]
async fn real_row_at_offset_id_is_left_in_place() {
  let s = store_with(KeyOffsets::default()).await;
  s.insert_record(sample_record()).await.unwrap();

  // Miscomputed offsets pointing at the real rows (id 1): the marker check
  // keeps them, and the call still succeeds.
  let wrong = KeyOffsets { entries: 1, criteria: 1, attributes: 1 };
  s.remove_sentinels(wrong).await.unwrap();

  assert_eq!(ids(&s, "entries").await, vec![0, 1]);
  assert_eq!(ids(&s, "criteria").await, vec![0, 1]);
  assert_eq!(ids(&s, "attributes").await, vec![0, 1]);
}

// ─── Full pipeline ───────────────────────────────────────────────────────────

#[tokio::test]
async fn two_files_one_record_each() {
  let dir = tempfile::tempdir().unwrap();
  write_gz(&dir.path().join("2024-01-01.gz"), &[SAMPLE_LINE]);
  write_gz(&dir.path().join("2024-01-02.gz"), &[SAMPLE_LINE]);

  let offsets = KeyOffsets::default();
  let s = store_with(offsets).await;
  let report = ingest_dir(&s, dir.path()).await.unwrap();
  s.remove_sentinels(offsets).await.unwrap();

  assert_eq!(report.files, 2);
  assert_eq!(report.records, 2);
  assert_eq!(ids(&s, "entries").await, vec![1, 2]);
  assert_eq!(entry_ids(&s, "criteria").await, vec![1, 2]);
  assert_eq!(entry_ids(&s, "attributes").await, vec![1, 2]);
}

#[tokio::test]
async fn malformed_line_does_not_abort_the_file() {
  let dir = tempfile::tempdir().unwrap();
  write_gz(&dir.path().join("logs.gz"), &["{broken", SAMPLE_LINE]);

  let offsets = KeyOffsets::default();
  let s = store_with(offsets).await;
  let report = ingest_dir(&s, dir.path()).await.unwrap();

  assert_eq!(report.records, 1);
  assert_eq!(report.skipped, 1);
  assert_eq!(s.row_count("entries").await.unwrap(), 2);
}

// ─── Dump ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dump_emits_backtick_quoted_inserts_in_id_order() {
  let offsets = KeyOffsets::default();
  let s = store_with(offsets).await;
  s.insert_record(sample_record()).await.unwrap();
  s.remove_sentinels(offsets).await.unwrap();

  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("batch.db.sql");
  let statements = s.dump_mysql(&path).await.unwrap();

  let dumped = std::fs::read_to_string(&path).unwrap();
  assert_eq!(statements, 3);
  assert_eq!(dumped.lines().collect::<Vec<_>>(), vec![
    "INSERT INTO `entries` VALUES(1,'2024-01-01','10.0.0.1');",
    "INSERT INTO `criteria` VALUES(1,1,'k1','v1');",
    "INSERT INTO `attributes` VALUES(1,1,'x');",
  ]);
}

#[tokio::test]
async fn dump_never_contains_sentinel_rows() {
  let offsets =
    KeyOffsets { entries: 10, criteria: 20, attributes: 30 };
  let s = store_with(offsets).await;
  s.insert_record(sample_record()).await.unwrap();
  s.remove_sentinels(offsets).await.unwrap();

  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("batch.db.sql");
  s.dump_mysql(&path).await.unwrap();

  let dumped = std::fs::read_to_string(&path).unwrap();
  assert!(!dumped.contains("__sentinel__"));
  assert!(dumped.contains("INSERT INTO `entries` VALUES(11,"));
}

#[tokio::test]
async fn dump_is_idempotent_and_overwrites() {
  let offsets = KeyOffsets::default();
  let s = store_with(offsets).await;
  s.insert_record(sample_record()).await.unwrap();
  s.remove_sentinels(offsets).await.unwrap();

  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("batch.db.sql");
  std::fs::write(&path, "stale content from an earlier run\n").unwrap();

  s.dump_mysql(&path).await.unwrap();
  let first = std::fs::read_to_string(&path).unwrap();
  s.dump_mysql(&path).await.unwrap();
  let second = std::fs::read_to_string(&path).unwrap();

  assert!(!first.contains("stale"));
  assert_eq!(first, second);
}

#[tokio::test]
async fn dump_escapes_quotes_in_values() {
  let offsets = KeyOffsets::default();
  let s = store_with(offsets).await;

  let mut record = sample_record();
  record.criteria[0].value = "it's a 'quoted' value".into();
  s.insert_record(record).await.unwrap();
  s.remove_sentinels(offsets).await.unwrap();

  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("batch.db.sql");
  s.dump_mysql(&path).await.unwrap();

  let dumped = std::fs::read_to_string(&path).unwrap();
  assert!(dumped.contains("'it''s a ''quoted'' value'"));
}

// ─── On-disk store ───────────────────────────────────────────────────────────

#[tokio::test]
async fn file_backed_store_round_trips() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("output.db");

  let offsets = KeyOffsets::default();
  let s = SqliteStore::open(&db).await.unwrap();
  s.init_schema(offsets).await.unwrap();
  s.insert_record(sample_record()).await.unwrap();
  s.remove_sentinels(offsets).await.unwrap();

  let path = dump_path(&db);
  assert_eq!(path, dir.path().join("output.db.sql"));
  s.dump_mysql(&path).await.unwrap();

  assert!(path.exists());
  assert_eq!(s.row_count("entries").await.unwrap(), 1);
}
