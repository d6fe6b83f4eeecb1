//! Metadata property names, the fixed seed stamp, and event ordering scope.
//!
//! The metadata table is populated once at store creation and treated as
//! immutable afterward. The reader derives its ordering rules from the three
//! ordering-related properties.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Property-name constants for the `DatasetMetadata` table.
pub mod properties {
  pub const VERSION: &str = "Version";
  pub const IS_EVENT_ORDERING_CONSISTENT: &str = "IsEventOrderingConsistent";
  pub const EVENT_ORDER_SCOPE: &str = "EventOrderScope";
  pub const EVENT_ORDER_SCOPE_COLUMNS: &str = "EventOrderScopeColumns";
  pub const CODE_STATE_REPRESENTATION: &str = "CodeStateRepresentation";
}

/// The fixed stamp written once when a store is first created.
///
/// Event IDs are monotonically increasing, so the log is globally
/// ordering-consistent; code text lives in the snapshot table.
pub const SEED_PROPERTIES: &[(&str, &str)] = &[
  (properties::VERSION, "8.0"),
  (properties::IS_EVENT_ORDERING_CONSISTENT, "1"),
  (properties::EVENT_ORDER_SCOPE, "Global"),
  (properties::EVENT_ORDER_SCOPE_COLUMNS, ""),
  (properties::CODE_STATE_REPRESENTATION, "Sqlite"),
];

/// Delimiter between grouping columns in `EventOrderScopeColumns`.
pub const SCOPE_COLUMN_DELIMITER: char = ';';

// ─── OrderScope ──────────────────────────────────────────────────────────────

/// The scope within which the main table's `Order` column is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderScope {
  /// `Order` is comparable across the whole main table.
  Global,
  /// `Order` is comparable only within the groups defined by
  /// `EventOrderScopeColumns`.
  Restricted,
  /// No ordering guarantee.
  None,
}

impl OrderScope {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Global => "Global",
      Self::Restricted => "Restricted",
      Self::None => "None",
    }
  }
}

impl std::str::FromStr for OrderScope {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "Global" => Ok(Self::Global),
      "Restricted" => Ok(Self::Restricted),
      "None" => Ok(Self::None),
      other => Err(Error::UnknownOrderScope(other.to_owned())),
    }
  }
}

impl std::fmt::Display for OrderScope {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
