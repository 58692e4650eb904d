//! Core types and pipeline logic for the silt log converter.
//!
//! This crate is deliberately free of database dependencies. The storage
//! backend plugs in through [`store::LogStore`]; everything here deals with
//! finding, decoding, and flattening log records.

pub mod error;
pub mod ingest;
pub mod record;
pub mod store;

pub use error::{Error, Result};
