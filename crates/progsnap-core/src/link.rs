//! Link-table records for problems and subjects.

use serde::{Deserialize, Serialize};

/// A `LinkProblem` row. Created lazily on the first starter-code write,
/// then updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
  pub problem_id:   String,
  pub starter_code: Option<String>,
  pub subgoals:     Option<String>,
}

/// A `LinkSubject` row. The intervention-group condition is
/// first-write-wins: once assigned, later writes for the same subject are
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:            String,
  pub is_intervention_group: bool,
}
