//! SQL generated from the schema registry.
//!
//! The registry declares tables and columns; this module turns those
//! declarations into DDL and the main-table insert. All DDL is idempotent
//! thanks to `IF NOT EXISTS`.

use progsnap_core::schema::{ColumnType, Schema, TableDef, columns};

fn sql_type(ty: ColumnType) -> &'static str {
  match ty {
    ColumnType::Integer => "INTEGER",
    ColumnType::Real => "REAL",
    ColumnType::Text => "TEXT",
  }
}

/// Idempotent CREATE TABLE for one declared table.
pub fn create_table_sql(table: &TableDef) -> String {
  let cols = table
    .columns
    .iter()
    .map(|c| {
      if c.primary_key {
        format!("`{}` {} PRIMARY KEY", c.name, sql_type(c.ty))
      } else {
        format!("`{}` {}", c.name, sql_type(c.ty))
      }
    })
    .collect::<Vec<_>>()
    .join(", ");
  format!("CREATE TABLE IF NOT EXISTS {} ({})", table.name, cols)
}

/// Index over snapshot code text; keeps the dedup lookup fast.
pub fn code_index_sql(schema: &Schema) -> String {
  format!(
    "CREATE INDEX IF NOT EXISTS idx_Code ON {} (`{}`)",
    schema.code_states.name,
    columns::CODE
  )
}

/// INSERT for one main-table row in declared column order. The surrogate
/// key is omitted; SQLite assigns it.
pub fn insert_event_sql(schema: &Schema) -> String {
  let cols: Vec<&str> = schema
    .main
    .column_names()
    .filter(|n| *n != columns::EVENT_ID)
    .collect();
  let names = cols
    .iter()
    .map(|c| format!("`{c}`"))
    .collect::<Vec<_>>()
    .join(", ");
  let marks = (1..=cols.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  format!("INSERT INTO {} ({}) VALUES ({})", schema.main.name, names, marks)
}

/// SELECT of every declared main-table column for one event.
pub fn select_event_sql(schema: &Schema) -> String {
  let names = schema
    .main
    .column_names()
    .map(|c| format!("`{c}`"))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "SELECT {} FROM {} WHERE `{}` = ?1",
    names,
    schema.main.name,
    columns::EVENT_ID
  )
}
