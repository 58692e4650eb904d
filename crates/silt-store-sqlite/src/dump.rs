//! MySQL-format dump of the store contents.
//!
//! Only data statements are emitted — the target database already owns its
//! schema. Identifiers use backtick quoting; text values are single-quoted
//! with `'` doubled and `\` escaped so MySQL reads them back verbatim.

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::{Path, PathBuf},
};

use rusqlite::types::Value;

use crate::{Result, schema, store::SqliteStore};

/// Path of the dump file for a store at `store_path`: the store file name
/// with `.sql` appended.
pub fn dump_path(store_path: &Path) -> PathBuf {
  let mut name = store_path.as_os_str().to_owned();
  name.push(".sql");
  PathBuf::from(name)
}

impl SqliteStore {
  /// Write every data row as one MySQL-compatible INSERT statement per line.
  ///
  /// Rows are emitted per table in id order, so output is a pure function of
  /// store contents and repeated dumps of an unchanged store are
  /// byte-identical. The file is created fresh (truncated) on every run.
  /// Returns the number of statements written.
  pub async fn dump_mysql(&self, path: &Path) -> Result<usize> {
    let statements = self
      .conn
      .call(|conn| {
        let mut statements = Vec::new();
        for table in schema::TABLES {
          let mut stmt = conn
            .prepare(&format!("SELECT * FROM {} ORDER BY id", table.name))?;
          let columns = stmt.column_count();
          let mut rows = stmt.query([])?;
          while let Some(row) = rows.next()? {
            let mut rendered = Vec::with_capacity(columns);
            for index in 0..columns {
              rendered.push(render_value(&row.get::<_, Value>(index)?));
            }
            statements.push(format!(
              "INSERT INTO `{}` VALUES({});",
              table.name,
              rendered.join(",")
            ));
          }
        }
        Ok(statements)
      })
      .await?;

    let mut out = BufWriter::new(File::create(path)?);
    for statement in &statements {
      writeln!(out, "{statement}")?;
    }
    out.flush()?;

    Ok(statements.len())
  }
}

/// Render one column value as a MySQL literal.
fn render_value(value: &Value) -> String {
  match value {
    Value::Null => "NULL".to_owned(),
    Value::Integer(i) => i.to_string(),
    Value::Real(r) => r.to_string(),
    Value::Text(s) => quote_text(s),
    Value::Blob(bytes) => {
      let mut hex = String::with_capacity(bytes.len() * 2 + 3);
      hex.push_str("X'");
      for byte in bytes {
        hex.push_str(&format!("{byte:02x}"));
      }
      hex.push('\'');
      hex
    }
  }
}

fn quote_text(text: &str) -> String {
  let mut quoted = String::with_capacity(text.len() + 2);
  quoted.push('\'');
  for c in text.chars() {
    match c {
      '\'' => quoted.push_str("''"),
      '\\' => quoted.push_str("\\\\"),
      other => quoted.push(other),
    }
  }
  quoted.push('\'');
  quoted
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quotes_and_escapes_text() {
    assert_eq!(quote_text("plain"), "'plain'");
    assert_eq!(quote_text("it's"), "'it''s'");
    assert_eq!(quote_text(r"back\slash"), r"'back\\slash'");
  }

  #[test]
  fn renders_scalar_values() {
    assert_eq!(render_value(&Value::Null), "NULL");
    assert_eq!(render_value(&Value::Integer(42)), "42");
    assert_eq!(render_value(&Value::Text("a".into())), "'a'");
  }

  #[test]
  fn dump_path_appends_sql_suffix() {
    assert_eq!(dump_path(Path::new("output.db")), Path::new("output.db.sql"));
    assert_eq!(
      dump_path(Path::new("/tmp/batch.db")),
      Path::new("/tmp/batch.db.sql")
    );
  }
}
