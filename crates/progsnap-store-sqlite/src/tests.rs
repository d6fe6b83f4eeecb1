//! Integration tests for `SqliteStore` against an in-memory database.

use progsnap_core::{
  event::{EventType, NewEvent},
  metadata::SEED_PROPERTIES,
  schema::{Schema, tables},
};
use rusqlite::types::Value as SqlValue;

use crate::SqliteStore;

fn store() -> SqliteStore {
  SqliteStore::open_in_memory(Schema::ps2()).expect("in-memory store")
}

fn count(store: &mut SqliteStore, table: &str) -> i64 {
  let rows = store
    .query(&format!("SELECT COUNT(*) FROM {table}"), &[])
    .unwrap();
  match rows[0][0] {
    SqlValue::Integer(n) => n,
    ref other => panic!("expected integer count, got {other:?}"),
  }
}

fn submit_with_code(code: &str) -> NewEvent {
  NewEvent {
    subject_id: Some("S1".into()),
    problem_id: Some("P1".into()),
    code_state: Some(code.into()),
    ..Default::default()
  }
}

// ─── Initialisation ──────────────────────────────────────────────────────────

#[test]
fn open_creates_all_tables() {
  let mut s = store();
  for table in [
    tables::MAIN,
    tables::CODE_STATES,
    tables::PROBLEMS,
    tables::SUBJECTS,
  ] {
    assert_eq!(count(&mut s, table), 0, "{table} should start empty");
  }
  assert_eq!(count(&mut s, tables::METADATA), SEED_PROPERTIES.len() as i64);
}

#[test]
fn metadata_seeded_exactly_once() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("events.db");

  let mut s = SqliteStore::open(&path, Schema::ps2()).unwrap();
  assert_eq!(count(&mut s, tables::METADATA), SEED_PROPERTIES.len() as i64);
  drop(s);

  // Reopening must not alter existing data or re-seed.
  let mut s = SqliteStore::open(&path, Schema::ps2()).unwrap();
  assert_eq!(count(&mut s, tables::METADATA), SEED_PROPERTIES.len() as i64);
}

#[test]
fn reopen_preserves_logged_events() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("events.db");

  let mut s = SqliteStore::open(&path, Schema::ps2()).unwrap();
  s.log_event(EventType::Submit, submit_with_code("x = 1")).unwrap();
  drop(s);

  let mut s = SqliteStore::open(&path, Schema::ps2()).unwrap();
  assert_eq!(count(&mut s, tables::MAIN), 1);
  let event = s.get_event(1).unwrap().unwrap();
  assert_eq!(event.subject_id.as_deref(), Some("S1"));
}

// ─── Code snapshot dedup ─────────────────────────────────────────────────────

#[test]
fn identical_code_shares_one_snapshot() {
  let mut s = store();
  s.log_event(EventType::Submit, submit_with_code("print(1)")).unwrap();
  s.log_event(EventType::Submit, submit_with_code("print(1)")).unwrap();
  s.log_event(EventType::Submit, submit_with_code("print(2)")).unwrap();

  assert_eq!(count(&mut s, tables::MAIN), 3);
  assert_eq!(count(&mut s, tables::CODE_STATES), 2);

  let first = s.get_event(1).unwrap().unwrap();
  let second = s.get_event(2).unwrap().unwrap();
  let third = s.get_event(3).unwrap().unwrap();
  assert_eq!(first.code_state_id, second.code_state_id);
  assert_ne!(first.code_state_id, third.code_state_id);
}

#[test]
fn get_or_create_code_state_is_idempotent() {
  let mut s = store();
  let a = s.get_or_create_code_state("def f(): pass").unwrap();
  let b = s.get_or_create_code_state("def f(): pass").unwrap();
  let c = s.get_or_create_code_state("def g(): pass").unwrap();
  assert_eq!(a, b);
  assert_ne!(a, c);
  assert_eq!(count(&mut s, tables::CODE_STATES), 2);
}

#[test]
fn event_without_code_has_null_snapshot() {
  let mut s = store();
  s.log_event(EventType::SessionStart, NewEvent::default()).unwrap();
  let event = s.get_event(1).unwrap().unwrap();
  assert_eq!(event.code_state_id, None);
  assert_eq!(count(&mut s, tables::CODE_STATES), 0);
}

// ─── Event append & lookup ───────────────────────────────────────────────────

#[test]
fn event_ids_are_monotonic_and_store_assigned() {
  let mut s = store();
  s.log_event(EventType::SessionStart, NewEvent::default()).unwrap();
  s.log_event(EventType::SessionEnd, NewEvent::default()).unwrap();

  assert_eq!(s.get_event(1).unwrap().unwrap().event_type, EventType::SessionStart);
  assert_eq!(s.get_event(2).unwrap().unwrap().event_type, EventType::SessionEnd);
  assert!(s.get_event(3).unwrap().is_none());
}

#[test]
fn logged_fields_round_trip() {
  let now = chrono::Utc::now();
  let mut s = store();
  s.log_event(
    EventType::RunTest,
    NewEvent {
      subject_id:       Some("S7".into()),
      problem_id:       Some("P3".into()),
      assignment_id:    Some("A1".into()),
      code_state:       Some("print('hi')".into()),
      client_timestamp: Some(now),
      server_timestamp: Some(now),
      score:            Some(0.5),
    },
  )
  .unwrap();

  let event = s.get_event(1).unwrap().unwrap();
  assert_eq!(event.event_type, EventType::RunTest);
  assert_eq!(event.subject_id.as_deref(), Some("S7"));
  assert_eq!(event.problem_id.as_deref(), Some("P3"));
  assert_eq!(event.assignment_id.as_deref(), Some("A1"));
  assert_eq!(event.client_timestamp, Some(now));
  assert_eq!(event.server_timestamp, Some(now));
  assert_eq!(event.score, Some(0.5));
}

#[test]
fn absent_fields_are_stored_as_null() {
  let mut s = store();
  s.log_event(EventType::Compile, NewEvent::default()).unwrap();
  let event = s.get_event(1).unwrap().unwrap();
  assert!(event.subject_id.is_none());
  assert!(event.problem_id.is_none());
  assert!(event.assignment_id.is_none());
  assert!(event.client_timestamp.is_none());
  assert!(event.server_timestamp.is_none());
  assert!(event.score.is_none());
}

#[test]
fn custom_event_types_are_accepted_unvalidated() {
  let mut s = store();
  s.log_event(EventType::Custom("X-Hint.Request".into()), NewEvent::default())
    .unwrap();
  let event = s.get_event(1).unwrap().unwrap();
  assert_eq!(event.event_type, EventType::Custom("X-Hint.Request".into()));
}

// ─── Starter code ────────────────────────────────────────────────────────────

#[test]
fn starter_code_upsert() {
  let mut s = store();
  s.set_starter_code("P1", "a").unwrap();
  s.set_starter_code("P1", "b").unwrap();
  assert_eq!(s.get_starter_code("P1").unwrap().as_deref(), Some("b"));
  assert_eq!(s.get_starter_code("P2").unwrap(), None);
  // One row per problem, updated in place.
  assert_eq!(count(&mut s, tables::PROBLEMS), 1);
}

#[test]
fn get_problem_returns_typed_row() {
  let mut s = store();
  s.set_starter_code("P9", "starter").unwrap();
  let problem = s.get_problem("P9").unwrap().unwrap();
  assert_eq!(problem.problem_id, "P9");
  assert_eq!(problem.starter_code.as_deref(), Some("starter"));
  assert_eq!(problem.subgoals, None);
  assert!(s.get_problem("P0").unwrap().is_none());
}

// ─── Subject condition ───────────────────────────────────────────────────────

#[test]
fn subject_condition_is_first_write_wins() {
  let mut s = store();
  assert!(s.get_or_set_subject_condition(Some("S1"), true).unwrap());
  // Second call ignores the new value and returns the stored one.
  assert!(s.get_or_set_subject_condition(Some("S1"), false).unwrap());

  let subject = s.get_subject("S1").unwrap().unwrap();
  assert!(subject.is_intervention_group);
}

#[test]
fn missing_subject_id_echoes_condition_without_storing() {
  let mut s = store();
  assert!(!s.get_or_set_subject_condition(None, false).unwrap());
  assert!(s.get_or_set_subject_condition(Some(""), true).unwrap());
  assert_eq!(count(&mut s, tables::SUBJECTS), 0);
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

#[test]
fn clear_table_empties_but_preserves_structure() {
  let mut s = store();
  s.log_event(EventType::Submit, submit_with_code("x")).unwrap();
  assert_eq!(count(&mut s, tables::MAIN), 1);

  s.clear_table(tables::MAIN).unwrap();
  assert_eq!(count(&mut s, tables::MAIN), 0);

  // The table still accepts appends.
  s.log_event(EventType::Submit, submit_with_code("y")).unwrap();
  assert_eq!(count(&mut s, tables::MAIN), 1);
}

#[test]
fn clear_table_rejects_unknown_names() {
  let mut s = store();
  let err = s.clear_table("NoSuchTable; DROP TABLE MainTable").unwrap_err();
  assert!(matches!(err, crate::Error::UnknownTable(_)));
}

#[test]
fn query_passthrough_is_parameterized() {
  let mut s = store();
  s.log_event(EventType::Submit, submit_with_code("a")).unwrap();
  s.log_event(
    EventType::Submit,
    NewEvent { subject_id: Some("S2".into()), ..Default::default() },
  )
  .unwrap();

  let rows = s
    .query(
      "SELECT `EventID` FROM MainTable WHERE `SubjectID` = ?1",
      &[&"S2"],
    )
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0][0], SqlValue::Integer(2));
}

// ─── Export ──────────────────────────────────────────────────────────────────

#[test]
fn export_writes_dataset_layout() {
  let dir = tempfile::tempdir().unwrap();
  let mut s = store();
  s.log_event(EventType::Submit, submit_with_code("print(1)")).unwrap();
  s.set_starter_code("P1", "pass").unwrap();
  s.get_or_set_subject_condition(Some("S1"), true).unwrap();

  s.export(dir.path()).unwrap();

  let main = std::fs::read_to_string(dir.path().join("MainTable.csv")).unwrap();
  let mut lines = main.lines();
  let header = lines.next().unwrap();
  assert!(header.starts_with("EventID,"));
  assert!(header.ends_with(",Order"));
  // One data row, Order synthesized as 1.
  assert!(lines.next().unwrap().ends_with(",1"));

  assert!(dir.path().join("DatasetMetadata.csv").exists());
  assert!(dir.path().join("CodeStates").join("CodeStates.csv").exists());
  assert!(dir.path().join("LinkTables").join("LinkProblem.csv").exists());
  assert!(dir.path().join("LinkTables").join("LinkSubject.csv").exists());
}
