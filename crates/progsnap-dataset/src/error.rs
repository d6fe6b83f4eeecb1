//! Error type for `progsnap-dataset`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] progsnap_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  /// `EventOrderScope` is `Restricted` but no scope columns are declared.
  #[error("event order scope is restricted but no scope columns are given")]
  RestrictedScopeWithoutColumns,

  #[error("multiple metadata rows for property {0:?}")]
  DuplicateProperty(String),

  #[error("multiple code states match ID {0}")]
  DuplicateCodeState(i64),

  #[error("multiple events match ID {0}")]
  DuplicateEvent(i64),

  #[error("missing column {0:?}")]
  MissingColumn(String),

  #[error("row has {got} cells but the table has {expected} columns")]
  RowWidth { expected: usize, got: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
