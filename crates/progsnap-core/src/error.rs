//! Error types for `progsnap-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown event order scope: {0:?}")]
  UnknownOrderScope(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
