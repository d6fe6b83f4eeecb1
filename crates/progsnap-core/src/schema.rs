//! The schema registry — an immutable description of the five dataset
//! tables.
//!
//! Constructed once (usually via [`Schema::ps2`]) and passed explicitly to
//! the store. The reader shares the same table and column name constants.
//! There is no global mutable state.

// ─── Names ───────────────────────────────────────────────────────────────────

/// Table name constants.
pub mod tables {
  pub const MAIN: &str = "MainTable";
  pub const CODE_STATES: &str = "CodeStates";
  pub const METADATA: &str = "DatasetMetadata";
  pub const PROBLEMS: &str = "LinkProblem";
  pub const SUBJECTS: &str = "LinkSubject";
}

/// File layout of a dataset directory on the read side. The store's export
/// writes this layout; the reader consumes it.
pub mod layout {
  pub const MAIN_TABLE_FILE: &str = "MainTable.csv";
  pub const METADATA_TABLE_FILE: &str = "DatasetMetadata.csv";
  pub const CODE_STATES_DIR: &str = "CodeStates";
  pub const CODE_STATES_TABLE_FILE: &str = "CodeStates.csv";
  pub const LINK_TABLE_DIR: &str = "LinkTables";
  pub const TABLE_FILE_EXTENSION: &str = ".csv";
}

/// Column name constants, shared by the store and the reader.
pub mod columns {
  pub const EVENT_ID: &str = "EventID";
  pub const ORDER: &str = "Order";
  pub const SUBJECT_ID: &str = "SubjectID";
  pub const PROBLEM_ID: &str = "ProblemID";
  pub const ASSIGNMENT_ID: &str = "AssignmentID";
  pub const EVENT_TYPE: &str = "EventType";
  pub const CODE_STATE_ID: &str = "CodeStateID";
  pub const CLIENT_TIMESTAMP: &str = "ClientTimestamp";
  pub const SERVER_TIMESTAMP: &str = "ServerTimestamp";
  pub const SCORE: &str = "Score";
  pub const CODE: &str = "Code";
  pub const PROPERTY: &str = "Property";
  pub const VALUE: &str = "Value";
  pub const STARTER_CODE: &str = "StarterCode";
  pub const SUBGOALS: &str = "Subgoals";
  pub const IS_INTERVENTION_GROUP: &str = "IsInterventionGroup";
}

// ─── Declarations ────────────────────────────────────────────────────────────

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Integer,
  Real,
  Text,
}

/// A single column declaration.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
  pub name:        &'static str,
  pub ty:          ColumnType,
  pub primary_key: bool,
}

/// A table declaration: a name and its ordered columns.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
  pub name:    &'static str,
  pub columns: &'static [ColumnDef],
}

impl TableDef {
  pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.columns.iter().map(|c| c.name)
  }
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnDef {
  ColumnDef { name, ty, primary_key: false }
}

const fn key(name: &'static str, ty: ColumnType) -> ColumnDef {
  ColumnDef { name, ty, primary_key: true }
}

const MAIN_COLUMNS: &[ColumnDef] = &[
  key(columns::EVENT_ID, ColumnType::Integer),
  col(columns::SUBJECT_ID, ColumnType::Text),
  col(columns::PROBLEM_ID, ColumnType::Text),
  col(columns::ASSIGNMENT_ID, ColumnType::Text),
  col(columns::EVENT_TYPE, ColumnType::Text),
  col(columns::CODE_STATE_ID, ColumnType::Integer),
  col(columns::CLIENT_TIMESTAMP, ColumnType::Text),
  col(columns::SERVER_TIMESTAMP, ColumnType::Text),
  col(columns::SCORE, ColumnType::Real),
];

const CODE_STATES_COLUMNS: &[ColumnDef] = &[
  key(columns::CODE_STATE_ID, ColumnType::Integer),
  col(columns::CODE, ColumnType::Text),
];

const METADATA_COLUMNS: &[ColumnDef] = &[
  col(columns::PROPERTY, ColumnType::Text),
  col(columns::VALUE, ColumnType::Text),
];

const PROBLEM_COLUMNS: &[ColumnDef] = &[
  key(columns::PROBLEM_ID, ColumnType::Text),
  col(columns::STARTER_CODE, ColumnType::Text),
  col(columns::SUBGOALS, ColumnType::Text),
];

const SUBJECT_COLUMNS: &[ColumnDef] = &[
  key(columns::SUBJECT_ID, ColumnType::Text),
  col(columns::IS_INTERVENTION_GROUP, ColumnType::Integer),
];

// ─── Schema ──────────────────────────────────────────────────────────────────

/// The full five-table layout: the main event log, the content-addressed
/// snapshot store, the dataset metadata, and the two link tables.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
  pub main:        TableDef,
  pub code_states: TableDef,
  pub metadata:    TableDef,
  pub problems:    TableDef,
  pub subjects:    TableDef,
}

impl Schema {
  /// The standard ProgSnap2-style layout.
  pub const fn ps2() -> Self {
    Self {
      main:        TableDef { name: tables::MAIN, columns: MAIN_COLUMNS },
      code_states: TableDef {
        name:    tables::CODE_STATES,
        columns: CODE_STATES_COLUMNS,
      },
      metadata:    TableDef {
        name:    tables::METADATA,
        columns: METADATA_COLUMNS,
      },
      problems:    TableDef { name: tables::PROBLEMS, columns: PROBLEM_COLUMNS },
      subjects:    TableDef { name: tables::SUBJECTS, columns: SUBJECT_COLUMNS },
    }
  }

  /// All tables in creation order.
  pub fn tables(&self) -> [&TableDef; 5] {
    [
      &self.main,
      &self.code_states,
      &self.metadata,
      &self.problems,
      &self.subjects,
    ]
  }

  /// Look up a table declaration by name.
  pub fn table(&self, name: &str) -> Option<&TableDef> {
    self.tables().into_iter().find(|t| t.name == name)
  }
}

impl Default for Schema {
  fn default() -> Self { Self::ps2() }
}
