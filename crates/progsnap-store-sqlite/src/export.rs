//! Export of a store into the on-disk CSV dataset layout consumed by the
//! dataset reader.
//!
//! The store itself never persists an `Order` column; the export
//! synthesizes one (1-based, in `EventID` order) so that readers of the
//! exported dataset can honor the seeded Global ordering metadata.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use tracing::debug;

use progsnap_core::schema::{Schema, TableDef, columns, layout};

use crate::{Result, store::SqliteStore};

impl SqliteStore {
  /// Write the full store contents as a CSV dataset directory:
  /// `MainTable.csv` (with the synthesized `Order` column),
  /// `DatasetMetadata.csv`, `CodeStates/CodeStates.csv`, and one file per
  /// link table under `LinkTables/`. NULLs become empty fields.
  pub fn export(&mut self, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    let schema = *self.schema();
    let code_states_dir = dir.join(layout::CODE_STATES_DIR);
    let link_dir = dir.join(layout::LINK_TABLE_DIR);
    std::fs::create_dir_all(&code_states_dir)?;
    std::fs::create_dir_all(&link_dir)?;

    self.export_main(&schema, &dir.join(layout::MAIN_TABLE_FILE))?;
    self.export_table(
      &schema.metadata,
      None,
      &dir.join(layout::METADATA_TABLE_FILE),
    )?;
    self.export_table(
      &schema.code_states,
      Some(columns::CODE_STATE_ID),
      &code_states_dir.join(layout::CODE_STATES_TABLE_FILE),
    )?;
    for link in [&schema.problems, &schema.subjects] {
      self.export_table(
        link,
        Some(link.columns[0].name),
        &link_dir.join(format!("{}{}", link.name, layout::TABLE_FILE_EXTENSION)),
      )?;
    }
    debug!(dir = %dir.display(), "exported dataset");
    Ok(())
  }

  fn export_main(&mut self, schema: &Schema, path: &Path) -> Result<()> {
    let mut header: Vec<&str> = schema.main.column_names().collect();
    header.push(columns::ORDER);
    let select = schema
      .main
      .column_names()
      .map(|c| format!("`{c}`"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "SELECT {} FROM {} ORDER BY `{}`",
      select,
      schema.main.name,
      columns::EVENT_ID,
    );

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&header)?;

    let width = schema.main.columns.len();
    let mut stmt = self.conn_mut().prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut order = 0i64;
    while let Some(row) = rows.next()? {
      order += 1;
      let mut record = Vec::with_capacity(width + 1);
      for i in 0..width {
        record.push(cell_text(row.get::<_, SqlValue>(i)?));
      }
      record.push(order.to_string());
      writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
  }

  fn export_table(
    &mut self,
    table: &TableDef,
    order_by: Option<&str>,
    path: &Path,
  ) -> Result<()> {
    let header: Vec<&str> = table.column_names().collect();
    let select = table
      .column_names()
      .map(|c| format!("`{c}`"))
      .collect::<Vec<_>>()
      .join(", ");
    let mut sql = format!("SELECT {} FROM {}", select, table.name);
    if let Some(col) = order_by {
      sql.push_str(&format!(" ORDER BY `{col}`"));
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&header)?;

    let width = header.len();
    let mut stmt = self.conn_mut().prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
      let mut record = Vec::with_capacity(width);
      for i in 0..width {
        record.push(cell_text(row.get::<_, SqlValue>(i)?));
      }
      writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
  }
}

/// NULL becomes an empty field; everything else is its plain text form.
fn cell_text(value: SqlValue) -> String {
  match value {
    SqlValue::Null => String::new(),
    SqlValue::Integer(i) => i.to_string(),
    SqlValue::Real(f) => f.to_string(),
    SqlValue::Text(t) => t,
    SqlValue::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
  }
}
