//! Core types and schema definitions for the progsnap workspace.
//!
//! This crate is deliberately free of database and file-system dependencies.
//! Both the store (`progsnap-store-sqlite`) and the dataset reader
//! (`progsnap-dataset`) depend on it; it depends on nothing heavier than
//! `serde` and `chrono`.

pub mod error;
pub mod event;
pub mod link;
pub mod metadata;
pub mod schema;

pub use error::{Error, Result};
