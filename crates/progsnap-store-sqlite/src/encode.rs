//! Encoding and decoding helpers between Rust domain types and the plain
//! text stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; every other column is already
//! a scalar.

use chrono::{DateTime, Utc};

use progsnap_core::event::{Event, EventType};

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a main-table row, in declared column
/// order.
pub struct RawEvent {
  pub event_id:         i64,
  pub subject_id:       Option<String>,
  pub problem_id:       Option<String>,
  pub assignment_id:    Option<String>,
  pub event_type:       String,
  pub code_state_id:    Option<i64>,
  pub client_timestamp: Option<String>,
  pub server_timestamp: Option<String>,
  pub score:            Option<f64>,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:         self.event_id,
      event_type:       EventType::from(self.event_type.as_str()),
      subject_id:       self.subject_id,
      problem_id:       self.problem_id,
      assignment_id:    self.assignment_id,
      code_state_id:    self.code_state_id,
      client_timestamp: self
        .client_timestamp
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      server_timestamp: self
        .server_timestamp
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      score:            self.score,
    })
  }
}
