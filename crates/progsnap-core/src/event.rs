//! Event types — one row per observed learner action.
//!
//! Events are append-only. The surrogate `EventID` is assigned by the store,
//! monotonically increasing, and never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── EventType ───────────────────────────────────────────────────────────────

/// The event-type vocabulary.
///
/// The standard tags are fixed but the set is open: the store never
/// validates membership, and [`EventType::Custom`] carries anything outside
/// the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
  /// Marks the start of a work session.
  SessionStart,
  /// Marks the end of a work session.
  SessionEnd,
  /// A project was opened.
  ProjectOpen,
  /// A project was closed. Consumers should be prepared for an open that is
  /// never terminated by an explicit close.
  ProjectClose,
  FileCreate,
  FileDelete,
  FileOpen,
  FileClose,
  FileSave,
  FileRename,
  FileCopy,
  /// The contents of a file were edited.
  FileEdit,
  /// A file was selected within the user interface.
  FileFocus,
  /// An attempt to compile all or part of the code.
  Compile,
  /// A compilation error and its associated diagnostic.
  CompileError,
  /// A compilation warning and its associated diagnostic.
  CompileWarning,
  /// Code was submitted to the system.
  Submit,
  /// A program execution and its associated input and/or output.
  RunProgram,
  /// Execution of a test and its associated input and/or output.
  RunTest,
  DebugProgram,
  DebugTest,
  /// A learning resource was viewed.
  ResourceView,
  /// An intervention, such as a hint, was shown.
  Intervention,
  /// Escape hatch for tags outside the standard vocabulary.
  Custom(String),
}

impl EventType {
  /// The tag string stored in the `EventType` column.
  pub fn as_str(&self) -> &str {
    match self {
      Self::SessionStart => "Session.Start",
      Self::SessionEnd => "Session.End",
      Self::ProjectOpen => "Project.Open",
      Self::ProjectClose => "Project.Close",
      Self::FileCreate => "File.Create",
      Self::FileDelete => "File.Delete",
      Self::FileOpen => "File.Open",
      Self::FileClose => "File.Close",
      Self::FileSave => "File.Save",
      Self::FileRename => "File.Rename",
      Self::FileCopy => "File.Copy",
      Self::FileEdit => "File.Edit",
      Self::FileFocus => "File.Focus",
      Self::Compile => "Compile",
      Self::CompileError => "Compile.Error",
      Self::CompileWarning => "Compile.Warning",
      Self::Submit => "Submit",
      Self::RunProgram => "Run.Program",
      Self::RunTest => "Run.Test",
      Self::DebugProgram => "Debug.Program",
      Self::DebugTest => "Debug.Test",
      Self::ResourceView => "Resource.View",
      Self::Intervention => "Intervention",
      Self::Custom(tag) => tag,
    }
  }
}

impl From<&str> for EventType {
  fn from(s: &str) -> Self {
    match s {
      "Session.Start" => Self::SessionStart,
      "Session.End" => Self::SessionEnd,
      "Project.Open" => Self::ProjectOpen,
      "Project.Close" => Self::ProjectClose,
      "File.Create" => Self::FileCreate,
      "File.Delete" => Self::FileDelete,
      "File.Open" => Self::FileOpen,
      "File.Close" => Self::FileClose,
      "File.Save" => Self::FileSave,
      "File.Rename" => Self::FileRename,
      "File.Copy" => Self::FileCopy,
      "File.Edit" => Self::FileEdit,
      "File.Focus" => Self::FileFocus,
      "Compile" => Self::Compile,
      "Compile.Error" => Self::CompileError,
      "Compile.Warning" => Self::CompileWarning,
      "Submit" => Self::Submit,
      "Run.Program" => Self::RunProgram,
      "Run.Test" => Self::RunTest,
      "Debug.Program" => Self::DebugProgram,
      "Debug.Test" => Self::DebugTest,
      "Resource.View" => Self::ResourceView,
      "Intervention" => Self::Intervention,
      other => Self::Custom(other.to_owned()),
    }
  }
}

impl std::fmt::Display for EventType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// Serialised as the plain tag string, matching the stored column value.

impl Serialize for EventType {
  fn serialize<S: serde::Serializer>(
    &self,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for EventType {
  fn deserialize<D: serde::Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Ok(Self::from(s.as_str()))
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A full main-table row as stored.
///
/// `code_state_id`, when present, references a row in the snapshot table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:         i64,
  pub event_type:       EventType,
  pub subject_id:       Option<String>,
  pub problem_id:       Option<String>,
  pub assignment_id:    Option<String>,
  pub code_state_id:    Option<i64>,
  pub client_timestamp: Option<DateTime<Utc>>,
  pub server_timestamp: Option<DateTime<Utc>>,
  pub score:            Option<f64>,
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// Input to `log_event`. Every field is optional; columns not supplied are
/// stored as NULL. `EventID` is always store-assigned and cannot appear here.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
  pub subject_id:       Option<String>,
  pub problem_id:       Option<String>,
  pub assignment_id:    Option<String>,
  /// Raw program text; deduplicated into the snapshot table on append.
  pub code_state:       Option<String>,
  pub client_timestamp: Option<DateTime<Utc>>,
  pub server_timestamp: Option<DateTime<Utc>>,
  pub score:            Option<f64>,
}
