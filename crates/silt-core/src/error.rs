//! Error types for `silt-core`.

use thiserror::Error;

/// Per-line decode failures. Both variants are recoverable: the walker skips
/// the offending line and keeps going.
#[derive(Debug, Error)]
pub enum Error {
  /// The line was not valid JSON at all.
  #[error("malformed JSON: {0}")]
  Parse(#[source] serde_json::Error),

  /// The line was valid JSON but lacked the expected record fields.
  #[error("unexpected record shape: {0}")]
  RecordShape(#[source] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
