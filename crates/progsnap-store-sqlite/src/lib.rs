//! SQLite backend for the progsnap event store.
//!
//! Synchronous by design: logging is single-writer, and every operation is
//! one connection-scoped transaction (open, act, commit). The analysis side
//! lives in `progsnap-dataset` and talks to this crate only through the
//! exported on-disk layout.

mod encode;
mod export;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
