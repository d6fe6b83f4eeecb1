//! [`SqliteStore`] — durable event append with content-dedup of code.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension as _, Transaction, params};
use rusqlite::types::Value as SqlValue;
use tracing::debug;

use progsnap_core::{
  event::{Event, EventType, NewEvent},
  link::{Problem, Subject},
  metadata::SEED_PROPERTIES,
  schema::{Schema, columns},
};

use crate::{
  Error, Result,
  encode::{RawEvent, encode_dt},
  schema::{code_index_sql, create_table_sql, insert_event_sql, select_event_sql},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An event store backed by a single SQLite file.
///
/// Single-writer by design: every operation runs as one transaction on one
/// connection, and the snapshot dedup is lookup-then-insert (see
/// [`SqliteStore::get_or_create_code_state`]).
pub struct SqliteStore {
  conn:   Connection,
  schema: Schema,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// Parent directories are created as needed. Initialisation is idempotent:
  /// tables are only created when absent, and the metadata stamp is seeded
  /// only when the metadata table has no rows.
  pub fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    let mut store = Self { conn, schema };
    store.init_schema()?;
    debug!(path = %path.display(), "opened event store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory(schema: Schema) -> Result<Self> {
    let conn = Connection::open_in_memory()?;
    let mut store = Self { conn, schema };
    store.init_schema()?;
    Ok(store)
  }

  pub fn schema(&self) -> &Schema { &self.schema }

  pub(crate) fn conn_mut(&mut self) -> &mut Connection { &mut self.conn }

  fn init_schema(&mut self) -> Result<()> {
    let tx = self.conn.transaction()?;
    for table in self.schema.tables() {
      tx.execute(&create_table_sql(table), [])?;
    }
    tx.execute(&code_index_sql(&self.schema), [])?;

    let rows: i64 = tx.query_row(
      &format!("SELECT COUNT(*) FROM {}", self.schema.metadata.name),
      [],
      |r| r.get(0),
    )?;
    if rows == 0 {
      let insert = format!(
        "INSERT INTO {} (`{}`, `{}`) VALUES (?1, ?2)",
        self.schema.metadata.name,
        columns::PROPERTY,
        columns::VALUE,
      );
      for (property, value) in SEED_PROPERTIES {
        tx.execute(&insert, params![property, value])?;
      }
    }
    tx.commit()?;
    Ok(())
  }

  // ── Events ────────────────────────────────────────────────────────────────

  /// Append one event. `EventID` is store-assigned; `code_state` text, when
  /// present, is resolved to a snapshot ID inside the same transaction, so a
  /// failed append leaves no orphan snapshot.
  pub fn log_event(
    &mut self,
    event_type: EventType,
    event: NewEvent,
  ) -> Result<()> {
    let tx = self.conn.transaction()?;
    let code_state_id = match event.code_state.as_deref() {
      Some(code) => Some(code_state_id_in(&tx, &self.schema, code)?),
      None => None,
    };
    tx.execute(
      &insert_event_sql(&self.schema),
      rusqlite::params_from_iter(event_row_values(
        &self.schema,
        &event_type,
        &event,
        code_state_id,
      )),
    )?;
    tx.commit()?;
    debug!(event_type = %event_type, "logged event");
    Ok(())
  }

  /// Look up one event by its surrogate ID.
  pub fn get_event(&mut self, event_id: i64) -> Result<Option<Event>> {
    let tx = self.conn.transaction()?;
    let raw = tx
      .query_row(&select_event_sql(&self.schema), params![event_id], |r| {
        Ok(RawEvent {
          event_id:         r.get(0)?,
          subject_id:       r.get(1)?,
          problem_id:       r.get(2)?,
          assignment_id:    r.get(3)?,
          event_type:       r.get(4)?,
          code_state_id:    r.get(5)?,
          client_timestamp: r.get(6)?,
          server_timestamp: r.get(7)?,
          score:            r.get(8)?,
        })
      })
      .optional()?;
    tx.commit()?;
    raw.map(RawEvent::into_event).transpose()
  }

  // ── Code snapshots ────────────────────────────────────────────────────────

  /// Get-or-create dedup: identical code text always resolves to the same
  /// snapshot ID. Lookup-then-insert; not safe under concurrent writers.
  pub fn get_or_create_code_state(&mut self, code: &str) -> Result<i64> {
    let tx = self.conn.transaction()?;
    let id = code_state_id_in(&tx, &self.schema, code)?;
    tx.commit()?;
    Ok(id)
  }

  // ── Problems ──────────────────────────────────────────────────────────────

  /// Stored starter code for a problem, or `None` when the problem has no
  /// row or no starter code.
  pub fn get_starter_code(&mut self, problem_id: &str) -> Result<Option<String>> {
    let tx = self.conn.transaction()?;
    let code: Option<Option<String>> = tx
      .query_row(
        &format!(
          "SELECT `{}` FROM {} WHERE `{}` = ?1",
          columns::STARTER_CODE,
          self.schema.problems.name,
          columns::PROBLEM_ID,
        ),
        params![problem_id],
        |r| r.get(0),
      )
      .optional()?;
    tx.commit()?;
    Ok(code.flatten())
  }

  /// Insert-if-absent then unconditional update, in one transaction.
  pub fn set_starter_code(
    &mut self,
    problem_id: &str,
    starter_code: &str,
  ) -> Result<()> {
    let tx = self.conn.transaction()?;
    tx.execute(
      &format!(
        "INSERT OR IGNORE INTO {} (`{}`) VALUES (?1)",
        self.schema.problems.name,
        columns::PROBLEM_ID,
      ),
      params![problem_id],
    )?;
    tx.execute(
      &format!(
        "UPDATE {} SET `{}` = ?1 WHERE `{}` = ?2",
        self.schema.problems.name,
        columns::STARTER_CODE,
        columns::PROBLEM_ID,
      ),
      params![starter_code, problem_id],
    )?;
    tx.commit()?;
    Ok(())
  }

  /// Retrieve a problem link row. Returns `None` if not found.
  pub fn get_problem(&mut self, problem_id: &str) -> Result<Option<Problem>> {
    let tx = self.conn.transaction()?;
    let problem = tx
      .query_row(
        &format!(
          "SELECT `{}`, `{}`, `{}` FROM {} WHERE `{}` = ?1",
          columns::PROBLEM_ID,
          columns::STARTER_CODE,
          columns::SUBGOALS,
          self.schema.problems.name,
          columns::PROBLEM_ID,
        ),
        params![problem_id],
        |r| {
          Ok(Problem {
            problem_id:   r.get(0)?,
            starter_code: r.get(1)?,
            subgoals:     r.get(2)?,
          })
        },
      )
      .optional()?;
    tx.commit()?;
    Ok(problem)
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  /// Retrieve a subject link row. Returns `None` if not found.
  pub fn get_subject(&mut self, subject_id: &str) -> Result<Option<Subject>> {
    let tx = self.conn.transaction()?;
    let subject = tx
      .query_row(
        &format!(
          "SELECT `{}`, `{}` FROM {} WHERE `{}` = ?1",
          columns::SUBJECT_ID,
          columns::IS_INTERVENTION_GROUP,
          self.schema.subjects.name,
          columns::SUBJECT_ID,
        ),
        params![subject_id],
        |r| {
          Ok(Subject {
            subject_id:            r.get(0)?,
            is_intervention_group: r.get::<_, i64>(1)? != 0,
          })
        },
      )
      .optional()?;
    tx.commit()?;
    Ok(subject)
  }

  /// First-write-wins condition assignment: an existing row's condition is
  /// returned untouched; otherwise the supplied condition is stored and
  /// returned. A missing or empty subject ID touches nothing and echoes the
  /// argument back.
  pub fn get_or_set_subject_condition(
    &mut self,
    subject_id: Option<&str>,
    condition: bool,
  ) -> Result<bool> {
    let Some(subject_id) = subject_id.filter(|s| !s.is_empty()) else {
      return Ok(condition);
    };
    let tx = self.conn.transaction()?;
    let existing: Option<i64> = tx
      .query_row(
        &format!(
          "SELECT `{}` FROM {} WHERE `{}` = ?1",
          columns::IS_INTERVENTION_GROUP,
          self.schema.subjects.name,
          columns::SUBJECT_ID,
        ),
        params![subject_id],
        |r| r.get(0),
      )
      .optional()?;
    let stored = match existing {
      Some(v) => v != 0,
      None => {
        tx.execute(
          &format!(
            "INSERT INTO {} (`{}`, `{}`) VALUES (?1, ?2)",
            self.schema.subjects.name,
            columns::SUBJECT_ID,
            columns::IS_INTERVENTION_GROUP,
          ),
          params![subject_id, condition as i64],
        )?;
        condition
      }
    };
    tx.commit()?;
    Ok(stored)
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  /// Delete all rows from a declared table; the structure is preserved. The
  /// name is validated against the schema registry, so arbitrary SQL can
  /// never reach the DELETE.
  pub fn clear_table(&mut self, table: &str) -> Result<()> {
    let Some(table) = self.schema.table(table) else {
      return Err(Error::UnknownTable(table.to_owned()));
    };
    let sql = format!("DELETE FROM {}", table.name);
    let tx = self.conn.transaction()?;
    tx.execute(&sql, [])?;
    tx.commit()?;
    Ok(())
  }

  /// Parameterized passthrough for advanced callers. Returns every result
  /// row as untyped column values.
  pub fn query(
    &mut self,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
  ) -> Result<Vec<Vec<SqlValue>>> {
    let tx = self.conn.transaction()?;
    let out = {
      let mut stmt = tx.prepare(sql)?;
      let count = stmt.column_count();
      let mut rows = stmt.query(params)?;
      let mut out = Vec::new();
      while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
          values.push(row.get::<_, SqlValue>(i)?);
        }
        out.push(values);
      }
      out
    };
    tx.commit()?;
    Ok(out)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Lookup-then-insert snapshot dedup inside an open transaction.
fn code_state_id_in(
  tx: &Transaction<'_>,
  schema: &Schema,
  code: &str,
) -> Result<i64> {
  let existing: Option<i64> = tx
    .query_row(
      &format!(
        "SELECT `{}` FROM {} WHERE `{}` = ?1",
        columns::CODE_STATE_ID,
        schema.code_states.name,
        columns::CODE,
      ),
      params![code],
      |r| r.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }
  tx.execute(
    &format!(
      "INSERT INTO {} (`{}`) VALUES (?1)",
      schema.code_states.name,
      columns::CODE,
    ),
    params![code],
  )?;
  Ok(tx.last_insert_rowid())
}

/// Column values for one main-table insert, in declared order with the
/// surrogate key skipped. Declared columns the record does not carry are
/// NULL.
fn event_row_values(
  schema: &Schema,
  event_type: &EventType,
  event: &NewEvent,
  code_state_id: Option<i64>,
) -> Vec<SqlValue> {
  schema
    .main
    .column_names()
    .filter(|n| *n != columns::EVENT_ID)
    .map(|name| match name {
      n if n == columns::SUBJECT_ID => opt_text(event.subject_id.clone()),
      n if n == columns::PROBLEM_ID => opt_text(event.problem_id.clone()),
      n if n == columns::ASSIGNMENT_ID => opt_text(event.assignment_id.clone()),
      n if n == columns::EVENT_TYPE => {
        SqlValue::Text(event_type.as_str().to_owned())
      }
      n if n == columns::CODE_STATE_ID => {
        code_state_id.map_or(SqlValue::Null, SqlValue::Integer)
      }
      n if n == columns::CLIENT_TIMESTAMP => {
        opt_text(event.client_timestamp.map(encode_dt))
      }
      n if n == columns::SERVER_TIMESTAMP => {
        opt_text(event.server_timestamp.map(encode_dt))
      }
      n if n == columns::SCORE => {
        event.score.map_or(SqlValue::Null, SqlValue::Real)
      }
      _ => SqlValue::Null,
    })
    .collect()
}

fn opt_text(v: Option<String>) -> SqlValue {
  v.map_or(SqlValue::Null, SqlValue::Text)
}
