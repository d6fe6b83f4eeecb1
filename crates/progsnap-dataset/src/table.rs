//! An owned, in-memory tabular structure with a header row.
//!
//! Cells are optional text: an empty CSV field reads as an absent value,
//! and an absent value writes back as an empty field.

use std::collections::HashSet;
use std::path::Path;

use crate::{Error, Result};

pub type Cell = Option<String>;
pub type Row = Vec<Cell>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
  columns: Vec<String>,
  rows:    Vec<Row>,
}

impl Table {
  pub fn new(columns: Vec<String>) -> Self {
    Self { columns, rows: Vec::new() }
  }

  // ── Shape ─────────────────────────────────────────────────────────────────

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn rows(&self) -> &[Row] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Index of a named column, or a typed error when it is missing.
  pub fn column_index(&self, name: &str) -> Result<usize> {
    self
      .columns
      .iter()
      .position(|c| c == name)
      .ok_or_else(|| Error::MissingColumn(name.to_owned()))
  }

  pub fn has_column(&self, name: &str) -> bool {
    self.columns.iter().any(|c| c == name)
  }

  // ── Cells & rows ──────────────────────────────────────────────────────────

  /// Cell at (row, named column); `None` for an absent value.
  pub fn get(&self, row: usize, column: &str) -> Result<Option<&str>> {
    let idx = self.column_index(column)?;
    Ok(self.rows[row][idx].as_deref())
  }

  pub fn push_row(&mut self, row: Row) -> Result<()> {
    if row.len() != self.columns.len() {
      return Err(Error::RowWidth {
        expected: self.columns.len(),
        got:      row.len(),
      });
    }
    self.rows.push(row);
    Ok(())
  }

  /// Keep only the rows the predicate accepts, preserving order.
  pub fn retain(&mut self, mut keep: impl FnMut(&Row) -> bool) {
    self.rows.retain(|row| keep(row));
  }

  /// Stable in-place sort by the given row comparison.
  pub fn sort_by(
    &mut self,
    mut cmp: impl FnMut(&Row, &Row) -> std::cmp::Ordering,
  ) {
    self.rows.sort_by(|a, b| cmp(a, b));
  }

  /// Remove a column and every cell under it.
  pub fn drop_column(&mut self, name: &str) -> Result<()> {
    let idx = self.column_index(name)?;
    self.columns.remove(idx);
    for row in &mut self.rows {
      row.remove(idx);
    }
    Ok(())
  }

  /// Distinct present values of a column, in first-seen order.
  pub fn distinct(&self, column: &str) -> Result<Vec<String>> {
    let idx = self.column_index(column)?;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in &self.rows {
      if let Some(value) = row[idx].as_deref() {
        if seen.insert(value.to_owned()) {
          out.push(value.to_owned());
        }
      }
    }
    Ok(out)
  }

  // ── CSV ───────────────────────────────────────────────────────────────────

  /// Read a delimited file with a header row.
  pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = reader.headers()?.iter().map(str::to_owned).collect();
    let mut table = Self { columns, rows: Vec::new() };
    for record in reader.records() {
      let row = record?
        .iter()
        .map(|field| {
          if field.is_empty() { None } else { Some(field.to_owned()) }
        })
        .collect();
      table.push_row(row)?;
    }
    Ok(table)
  }

  /// Write as a delimited file with a header row.
  pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&self.columns)?;
    for row in &self.rows {
      writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or_default()))?;
    }
    writer.flush()?;
    Ok(())
  }
}
