//! Log record decoding and flattening.
//!
//! A source line is one JSON object. Decoding is two-stage so the walker can
//! tell a line that is not JSON apart from a record that is JSON but the
//! wrong shape: the former is [`Error::Parse`], the latter
//! [`Error::RecordShape`].

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── Flattened rows ──────────────────────────────────────────────────────────

/// One key/value pair destined for the `criteria` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
  pub key:   String,
  pub value: String,
}

/// A fully flattened record: the parent row plus the ordered child rows
/// derived from it. Ids are assigned by the store on insert, so none appear
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
  pub date:       String,
  pub ip_address: String,
  /// `criteria` rows, in source order.
  pub criteria:   Vec<Criterion>,
  /// `attributes` rows, in source order.
  pub attributes: Vec<String>,
}

impl LogRecord {
  /// Decode one source line into a flattened record.
  pub fn parse_line(line: &str) -> Result<Self> {
    let value: Value = serde_json::from_str(line).map_err(Error::Parse)?;
    let raw: RawRecord =
      serde_json::from_value(value).map_err(Error::RecordShape)?;
    Ok(raw.flatten())
  }
}

// ─── Source shape ────────────────────────────────────────────────────────────

/// The shape a source line must decode to. Field names follow the log
/// producer's camelCase convention.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
  date:           String,
  ip_address:     String,
  secondary_data: SecondaryData,
  tertiary_data:  Vec<Value>,
}

/// `secondaryData` is normally an array of objects; a bare object also
/// appears in the wild and is treated as a one-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SecondaryData {
  Groups(Vec<Map<String, Value>>),
  Single(Map<String, Value>),
}

impl RawRecord {
  /// Flatten into parent and child rows. Key order within an object and
  /// element order within arrays follow the source document.
  fn flatten(self) -> LogRecord {
    let groups = match self.secondary_data {
      SecondaryData::Groups(groups) => groups,
      SecondaryData::Single(map) => vec![map],
    };

    let criteria = groups
      .into_iter()
      .flat_map(|map| {
        map
          .into_iter()
          .map(|(key, value)| Criterion { key, value: text_of(value) })
      })
      .collect();

    let attributes = self.tertiary_data.into_iter().map(text_of).collect();

    LogRecord {
      date: self.date,
      ip_address: self.ip_address,
      criteria,
      attributes,
    }
  }
}

/// Render a JSON value for a TEXT column: strings pass through unquoted,
/// everything else keeps its compact JSON form.
fn text_of(value: Value) -> String {
  match value {
    Value::String(s) => s,
    other => other.to_string(),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
