//! `silt` — convert a tree of gzipped JSON logs into an SQLite batch plus a
//! MySQL-compatible dump that can be appended to a live database.
//!
//! # Usage
//!
//! ```
//! silt --path /var/log/json --store output.db \
//!      --entry-offset 41000 --criterion-offset 181000 --attribute-offset 9000
//! ```
//!
//! The offsets should sit above the live tables' highest ids; generated keys
//! start at `offset + 1`.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use silt_core::{
  ingest::ingest_dir,
  store::{KeyOffsets, LogStore as _},
};
use silt_store_sqlite::{SqliteStore, dump_path};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
  author,
  version,
  about = "Convert gzipped JSON logs into a mergeable SQL batch"
)]
struct Cli {
  /// Directory containing gzip-compressed JSON log files.
  #[arg(long, value_name = "DIR")]
  path: PathBuf,

  /// SQLite database file to create.
  #[arg(long, value_name = "FILE", default_value = "output.db")]
  store: PathBuf,

  /// Starting id for the entries table.
  #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
  entry_offset: i64,

  /// Starting id for the criteria table.
  #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
  criterion_offset: i64,

  /// Starting id for the attributes table.
  #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
  attribute_offset: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let offsets = KeyOffsets {
    entries:    cli.entry_offset,
    criteria:   cli.criterion_offset,
    attributes: cli.attribute_offset,
  };

  let store = SqliteStore::open(&cli.store)
    .await
    .with_context(|| format!("failed to open store at {:?}", cli.store))?;

  store
    .init_schema(offsets)
    .await
    .context("failed to initialize schema")?;

  let report = ingest_dir(&store, &cli.path)
    .await
    .context("ingest failed")?;
  tracing::info!(
    files = report.files,
    records = report.records,
    skipped = report.skipped,
    "ingest complete"
  );

  store
    .remove_sentinels(offsets)
    .await
    .context("failed to remove sentinel rows")?;

  let dump = dump_path(&cli.store);
  let statements = store
    .dump_mysql(&dump)
    .await
    .with_context(|| format!("failed to write dump to {dump:?}"))?;
  tracing::info!(statements, dump = %dump.display(), "dump written");

  Ok(())
}
