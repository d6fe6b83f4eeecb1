//! Reader for persisted progsnap datasets.
//!
//! A dataset directory holds delimited tables with header rows: the main
//! event table, the dataset metadata, the code-state snapshots under
//! `CodeStates/`, and any number of link tables under `LinkTables/`. The
//! reader loads them lazily, applies the ordering the metadata declares,
//! and supports filtered subsetting and trace reconstruction.
//!
//! The reader never locks: it assumes the on-disk dataset is not mutated
//! concurrently with reads. Caches live for the life of the instance;
//! construct a new [`Dataset`] to pick up on-disk changes.

pub mod dataset;
pub mod error;
pub mod table;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use table::Table;
