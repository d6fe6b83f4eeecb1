//! [`Dataset`] — read-only access to a persisted dataset directory with
//! metadata-driven ordering and filtering.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use progsnap_core::{
  metadata::{OrderScope, SCOPE_COLUMN_DELIMITER, properties},
  schema::{columns, layout},
};

use crate::{
  Error, Result,
  table::{Cell, Row, Table},
};

// ─── Dataset ─────────────────────────────────────────────────────────────────

/// Reader over a dataset directory.
///
/// Tables load lazily on first access and stay cached for the life of the
/// instance; construct a new reader to pick up on-disk changes. Accessors
/// hand out defensive copies — [`Dataset::drop_main_table_column`] is the
/// single operation that mutates the cached main table in place.
pub struct Dataset {
  directory:         PathBuf,
  main_table:        Option<Table>,
  metadata_table:    Option<Table>,
  code_states_table: Option<Table>,
}

impl Dataset {
  pub fn open(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory:         directory.into(),
      main_table:        None,
      metadata_table:    None,
      code_states_table: None,
    }
  }

  fn path(&self, local: &str) -> PathBuf { self.directory.join(local) }

  fn link_table_dir(&self) -> PathBuf { self.path(layout::LINK_TABLE_DIR) }

  fn code_states_path(&self) -> PathBuf {
    self
      .path(layout::CODE_STATES_DIR)
      .join(layout::CODE_STATES_TABLE_FILE)
  }

  // ── Main table ────────────────────────────────────────────────────────────

  fn load_main(&mut self) -> Result<()> {
    if self.main_table.is_none() {
      let mut table =
        Table::from_csv_path(self.path(layout::MAIN_TABLE_FILE))?;
      self.apply_event_ordering(&mut table)?;
      debug!(rows = table.len(), "loaded main table");
      self.main_table = Some(table);
    }
    Ok(())
  }

  fn main(&mut self) -> Result<&mut Table> {
    self.load_main()?;
    // Populated by load_main; the closure never runs.
    Ok(self.main_table.get_or_insert_with(Table::default))
  }

  /// The main event table, ordered per the dataset metadata. Returns a
  /// copy; caller mutation never reaches the cache.
  pub fn get_main_table(&mut self) -> Result<Table> {
    Ok(self.main()?.clone())
  }

  /// Replace the cached main table. Later operations, including
  /// [`Dataset::save_subset`], use the replacement.
  pub fn set_main_table(&mut self, table: Table) {
    self.main_table = Some(table);
  }

  /// Remove a column from the cached main table in place. This is the one
  /// accessor that mutates the cache rather than a returned copy.
  pub fn drop_main_table_column(&mut self, column: &str) -> Result<()> {
    self.main()?.drop_column(column)
  }

  fn apply_event_ordering(&mut self, table: &mut Table) -> Result<()> {
    if !self.is_event_ordering_consistent()? {
      return Ok(());
    }
    match self.event_order_scope()? {
      OrderScope::None => Ok(()),
      OrderScope::Global => sort_events(table, &[]),
      OrderScope::Restricted => {
        let scope_columns = self.event_order_scope_columns()?;
        if scope_columns.is_empty() {
          return Err(Error::RestrictedScopeWithoutColumns);
        }
        sort_events(table, &scope_columns)
      }
    }
  }

  // ── Metadata ──────────────────────────────────────────────────────────────

  /// Value of a metadata property. Exactly one row may declare a property;
  /// more is a schema violation. The three ordering-related properties fall
  /// back to their documented defaults when absent; anything else absent is
  /// `None`.
  pub fn get_metadata_property(&mut self, name: &str) -> Result<Option<String>> {
    let metadata_path = self.path(layout::METADATA_TABLE_FILE);
    let table = load_cached(&mut self.metadata_table, &metadata_path)?;
    let idx_property = table.column_index(columns::PROPERTY)?;
    let idx_value = table.column_index(columns::VALUE)?;

    let mut matches = table
      .rows()
      .iter()
      .filter(|row| row[idx_property].as_deref() == Some(name));
    let first = matches.next();
    if matches.next().is_some() {
      return Err(Error::DuplicateProperty(name.to_owned()));
    }
    if let Some(row) = first {
      return Ok(Some(row[idx_value].clone().unwrap_or_default()));
    }

    // Defaults for datasets that predate the ordering properties.
    Ok(match name {
      properties::IS_EVENT_ORDERING_CONSISTENT => Some("0".to_owned()),
      properties::EVENT_ORDER_SCOPE => {
        Some(OrderScope::None.as_str().to_owned())
      }
      properties::EVENT_ORDER_SCOPE_COLUMNS => Some(String::new()),
      _ => None,
    })
  }

  pub fn is_event_ordering_consistent(&mut self) -> Result<bool> {
    Ok(
      self
        .get_metadata_property(properties::IS_EVENT_ORDERING_CONSISTENT)?
        .as_deref()
        .is_some_and(parse_flag),
    )
  }

  pub fn event_order_scope(&mut self) -> Result<OrderScope> {
    match self.get_metadata_property(properties::EVENT_ORDER_SCOPE)? {
      Some(value) => Ok(value.parse::<OrderScope>()?),
      None => Ok(OrderScope::None),
    }
  }

  /// Grouping columns declared for `Restricted` ordering, in declared
  /// order.
  pub fn event_order_scope_columns(&mut self) -> Result<Vec<String>> {
    let raw = self
      .get_metadata_property(properties::EVENT_ORDER_SCOPE_COLUMNS)?
      .unwrap_or_default();
    Ok(
      raw
        .split(SCOPE_COLUMN_DELIMITER)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect(),
    )
  }

  // ── Code states ───────────────────────────────────────────────────────────

  /// The code-state snapshot table. Returns a copy.
  pub fn get_code_states_table(&mut self) -> Result<Table> {
    let path = self.code_states_path();
    Ok(load_cached(&mut self.code_states_table, &path)?.clone())
  }

  /// Code text for a snapshot ID; `None` in, `None` out. More than one row
  /// for an ID is a schema violation.
  pub fn get_code_for_id(
    &mut self,
    code_state_id: Option<i64>,
  ) -> Result<Option<String>> {
    let Some(id) = code_state_id else {
      return Ok(None);
    };
    let id_text = id.to_string();
    let path = self.code_states_path();
    let table = load_cached(&mut self.code_states_table, &path)?;
    let idx_id = table.column_index(columns::CODE_STATE_ID)?;
    let idx_code = table.column_index(columns::CODE)?;

    let mut matches = table
      .rows()
      .iter()
      .filter(|row| row[idx_id].as_deref() == Some(id_text.as_str()));
    let first = matches.next();
    if matches.next().is_some() {
      return Err(Error::DuplicateCodeState(id));
    }
    Ok(first.map(|row| row[idx_code].clone().unwrap_or_default()))
  }

  /// Code text attached to one event, resolved through its `CodeStateID`.
  pub fn get_code_for_event_id(
    &mut self,
    event_id: i64,
  ) -> Result<Option<String>> {
    let id_text = event_id.to_string();
    let code_state_id = {
      let table = self.main()?;
      let idx_event = table.column_index(columns::EVENT_ID)?;
      let idx_code_state = table.column_index(columns::CODE_STATE_ID)?;

      let mut matches = table
        .rows()
        .iter()
        .filter(|row| row[idx_event].as_deref() == Some(id_text.as_str()));
      let first = matches.next();
      if matches.next().is_some() {
        return Err(Error::DuplicateEvent(event_id));
      }
      match first {
        Some(row) => parse_id(&row[idx_code_state]),
        None => return Ok(None),
      }
    };
    self.get_code_for_id(code_state_id)
  }

  // ── Distinct IDs & traces ─────────────────────────────────────────────────

  pub fn get_subject_ids(&mut self) -> Result<Vec<String>> {
    self.main()?.distinct(columns::SUBJECT_ID)
  }

  pub fn get_problem_ids(&mut self) -> Result<Vec<String>> {
    self.main()?.distinct(columns::PROBLEM_ID)
  }

  /// The ordered sequence of code snapshots a subject produced while
  /// working a problem: distinct `CodeStateID`s in main-table order, mapped
  /// to their code text. Null IDs and dangling references are skipped.
  pub fn get_trace(
    &mut self,
    subject_id: &str,
    problem_id: &str,
  ) -> Result<Vec<String>> {
    let ids = {
      let table = self.main()?;
      let idx_subject = table.column_index(columns::SUBJECT_ID)?;
      let idx_problem = table.column_index(columns::PROBLEM_ID)?;
      let idx_code_state = table.column_index(columns::CODE_STATE_ID)?;

      let mut seen = HashSet::new();
      let mut ids = Vec::new();
      for row in table.rows() {
        if row[idx_subject].as_deref() != Some(subject_id)
          || row[idx_problem].as_deref() != Some(problem_id)
        {
          continue;
        }
        if let Some(id) = parse_id(&row[idx_code_state]) {
          if seen.insert(id) {
            ids.push(id);
          }
        }
      }
      ids
    };

    let mut trace = Vec::with_capacity(ids.len());
    for id in ids {
      if let Some(code) = self.get_code_for_id(Some(id))? {
        trace.push(code);
      }
    }
    Ok(trace)
  }

  // ── Link tables ───────────────────────────────────────────────────────────

  /// Names of the link-table files in this dataset, loadable with
  /// [`Dataset::load_link_table`].
  pub fn list_link_tables(&self) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(self.link_table_dir())? {
      let entry = entry?;
      let name = entry.file_name().to_string_lossy().into_owned();
      if entry.file_type()?.is_file()
        && name.ends_with(layout::TABLE_FILE_EXTENSION)
      {
        names.push(name);
      }
    }
    names.sort();
    Ok(names)
  }

  /// Load a link table by name or file name; the file extension is added
  /// when missing.
  pub fn load_link_table(&self, name: &str) -> Result<Table> {
    let file = if name.ends_with(layout::TABLE_FILE_EXTENSION) {
      name.to_owned()
    } else {
      format!("{name}{}", layout::TABLE_FILE_EXTENSION)
    };
    Table::from_csv_path(self.link_table_dir().join(file))
  }

  // ── Subsetting ────────────────────────────────────────────────────────────

  /// Export a filtered copy of the dataset to `target`.
  ///
  /// The filter receives a copy of the (ordered) main table and returns the
  /// table to keep. Code states are restricted to the snapshots the
  /// surviving rows reference; metadata is copied unchanged. When
  /// `copy_link_tables` is set, each link table is filtered to the rows
  /// whose ID-column tuple (columns ending in `ID` that both tables share)
  /// appears among the surviving main rows; a link table sharing no ID
  /// column is copied unfiltered.
  pub fn save_subset(
    &mut self,
    target: impl AsRef<Path>,
    filter: impl FnOnce(Table) -> Table,
    copy_link_tables: bool,
  ) -> Result<()> {
    let target = target.as_ref();
    std::fs::create_dir_all(target.join(layout::CODE_STATES_DIR))?;

    let main = filter(self.get_main_table()?);
    main.write_csv_path(target.join(layout::MAIN_TABLE_FILE))?;

    let kept_ids: HashSet<String> =
      main.distinct(columns::CODE_STATE_ID)?.into_iter().collect();
    let mut code_states = self.get_code_states_table()?;
    let idx_id = code_states.column_index(columns::CODE_STATE_ID)?;
    code_states
      .retain(|row| row[idx_id].as_deref().is_some_and(|v| kept_ids.contains(v)));
    code_states.write_csv_path(
      target
        .join(layout::CODE_STATES_DIR)
        .join(layout::CODE_STATES_TABLE_FILE),
    )?;

    let metadata_path = self.path(layout::METADATA_TABLE_FILE);
    load_cached(&mut self.metadata_table, &metadata_path)?
      .write_csv_path(target.join(layout::METADATA_TABLE_FILE))?;

    if !copy_link_tables {
      return Ok(());
    }

    std::fs::create_dir_all(target.join(layout::LINK_TABLE_DIR))?;
    for name in self.list_link_tables()? {
      let mut link = self.load_link_table(&name)?;
      let shared: Vec<String> = link
        .columns()
        .iter()
        .filter(|c| c.ends_with("ID") && main.has_column(c))
        .cloned()
        .collect();
      if shared.is_empty() {
        link.write_csv_path(target.join(layout::LINK_TABLE_DIR).join(&name))?;
        continue;
      }

      let main_idx: Vec<usize> = shared
        .iter()
        .map(|c| main.column_index(c))
        .collect::<Result<_>>()?;
      let kept: HashSet<Row> = main
        .rows()
        .iter()
        .map(|row| main_idx.iter().map(|&i| row[i].clone()).collect())
        .collect();

      let link_idx: Vec<usize> = shared
        .iter()
        .map(|c| link.column_index(c))
        .collect::<Result<_>>()?;
      link.retain(|row| {
        let key: Row = link_idx.iter().map(|&i| row[i].clone()).collect();
        kept.contains(&key)
      });
      link.write_csv_path(target.join(layout::LINK_TABLE_DIR).join(&name))?;
    }
    debug!(target = %target.display(), "saved dataset subset");
    Ok(())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn load_cached<'a>(
  slot: &'a mut Option<Table>,
  path: &Path,
) -> Result<&'a mut Table> {
  if slot.is_none() {
    *slot = Some(Table::from_csv_path(path)?);
  }
  // The slot is always populated here; the closure never runs.
  Ok(slot.get_or_insert_with(Table::default))
}

/// Stable sort by the grouping columns (text order), then the `Order`
/// column (numeric order). Within groups the original row order breaks
/// ties.
fn sort_events(table: &mut Table, group_columns: &[String]) -> Result<()> {
  let group_idx: Vec<usize> = group_columns
    .iter()
    .map(|c| table.column_index(c))
    .collect::<Result<_>>()?;
  let order_idx = table.column_index(columns::ORDER)?;
  table.sort_by(|a, b| {
    for &idx in &group_idx {
      let ord = cmp_text(&a[idx], &b[idx]);
      if ord != Ordering::Equal {
        return ord;
      }
    }
    cmp_numeric(&a[order_idx], &b[order_idx])
  });
  Ok(())
}

/// Truthy metadata flag: `1` or `true` in any case.
fn parse_flag(value: &str) -> bool {
  matches!(value.trim(), "1" | "true" | "True" | "TRUE")
}

/// Absent values sort after present ones.
fn cmp_text(a: &Cell, b: &Cell) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => a.cmp(b),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

/// Numeric comparison when both cells parse as numbers, text otherwise.
fn cmp_numeric(a: &Cell, b: &Cell) -> Ordering {
  let parse = |c: &Cell| c.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
  match (parse(a), parse(b)) {
    (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    _ => cmp_text(a, b),
  }
}

/// Integer ID from a cell; pandas-style exports write integer IDs as
/// floats, so `5.0` also parses.
fn parse_id(cell: &Cell) -> Option<i64> {
  let text = cell.as_deref()?.trim();
  text.parse::<i64>().ok().or_else(|| {
    text
      .parse::<f64>()
      .ok()
      .filter(|f| f.fract() == 0.0)
      .map(|f| f as i64)
  })
}
