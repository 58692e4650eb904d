//! SQLite backend for the silt batch store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod dump;
mod schema;
mod store;

pub mod error;

pub use dump::dump_path;
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
