//! The ingest walker: deterministic traversal of gzipped JSON log files.
//!
//! Files are processed in lexicographic order of their full path, so two runs
//! over the same input set assign identical keys. Each record's row set is
//! committed atomically by the store; a bad line is skipped and reported
//! without aborting the batch.

use std::{
  fs::File,
  io::{BufRead, BufReader},
  path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use thiserror::Error;
use walkdir::WalkDir;

use crate::{record::LogRecord, store::LogStore};

/// Suffix a file must carry to be ingested.
const GZIP_SUFFIX: &str = ".gz";

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Fatal ingest failures. Per-line decode errors never appear here; they are
/// counted in the [`IngestReport`] instead.
#[derive(Debug, Error)]
pub enum IngestError<E> {
  #[error("failed to read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to walk source directory: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Counts reported after a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
  /// Gzip files processed.
  pub files:   usize,
  /// Records flattened and committed.
  pub records: usize,
  /// Lines skipped as malformed JSON or wrongly shaped records.
  pub skipped: usize,
}

// ─── Walker ──────────────────────────────────────────────────────────────────

/// Enumerate the `.gz` files under `dir`, recursively, sorted by full path.
pub fn collect_log_files(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
  let mut files = Vec::new();
  for entry in WalkDir::new(dir) {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    if entry.file_name().to_string_lossy().ends_with(GZIP_SUFFIX) {
      files.push(entry.into_path());
    }
  }
  files.sort();
  Ok(files)
}

/// Stream every log file under `dir` into `store`, one committed row set per
/// record.
pub async fn ingest_dir<S: LogStore>(
  store: &S,
  dir: &Path,
) -> Result<IngestReport, IngestError<S::Error>> {
  let files = collect_log_files(dir)?;
  let mut report = IngestReport::default();

  for path in files {
    tracing::info!(file = %path.display(), "ingesting");
    ingest_file(store, &path, &mut report).await?;
    report.files += 1;
  }

  Ok(report)
}

async fn ingest_file<S: LogStore>(
  store: &S,
  path: &Path,
  report: &mut IngestReport,
) -> Result<(), IngestError<S::Error>> {
  let file = File::open(path).map_err(|source| IngestError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let reader = BufReader::new(GzDecoder::new(BufReader::new(file)));

  for (index, line) in reader.lines().enumerate() {
    let line = line.map_err(|source| IngestError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    let record = match LogRecord::parse_line(&line) {
      Ok(record) => record,
      Err(error) => {
        tracing::warn!(
          file = %path.display(),
          line = index + 1,
          %error,
          "skipping line"
        );
        report.skipped += 1;
        continue;
      }
    };

    store
      .insert_record(record)
      .await
      .map_err(IngestError::Store)?;
    report.records += 1;
  }

  Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
