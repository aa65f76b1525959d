//! Bulk inserts: many records, one statement.

use crate::cursor::Cursor;
use sqlscope_core::{Error, Params, Result, Value, format_uuid};

/// One row of named values for a bulk insert.
///
/// Columns keep their insertion order; setting a column again replaces its
/// value in place.
///
/// # Example
///
/// ```
/// use sqlscope::Record;
///
/// let record = Record::new().set("name", "ada").set("age", 36);
/// assert_eq!(record.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous value for that column.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Record::new(), |record, (column, value)| {
                record.set(column, value)
            })
    }
}

/// Insert every record with a single multi-row INSERT statement.
///
/// The column list comes from the first record; every other record must
/// carry at least those columns (extras are ignored). Identifiers are
/// quoted, values travel as bound parameters, and UUIDs bind as their
/// hyphenated text form. With no records nothing reaches the driver.
pub fn insert_rows(cursor: &mut Cursor, table: &str, rows: &[Record]) -> Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let columns: Vec<&str> = first.columns().collect();
    if columns.is_empty() {
        return Err(Error::Custom(format!(
            "bulk insert into {table:?} needs at least one column"
        )));
    }

    let dialect = cursor.dialect();
    let mut params = Vec::with_capacity(columns.len() * rows.len());
    let mut groups = Vec::with_capacity(rows.len());
    for (ri, record) in rows.iter().enumerate() {
        let mut placeholders = Vec::with_capacity(columns.len());
        for column in &columns {
            let value = record.get(column).ok_or_else(|| {
                Error::Custom(format!("bulk insert row {ri} is missing column {column:?}"))
            })?;
            params.push(bind_ready(value));
            // placeholders are numbered across the whole statement
            placeholders.push(dialect.placeholder(params.len()));
        }
        groups.push(format!("({})", placeholders.join(", ")));
    }

    let column_list = columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list,
        groups.join(", "),
    );
    tracing::debug!(table, rows = rows.len(), "bulk insert");
    cursor.execute(&sql, &Params::Positional(params))
}

/// UUIDs bind as hyphenated text; everything else binds as-is.
fn bind_ready(value: &Value) -> Value {
    match value {
        Value::Uuid(bytes) => Value::Text(format_uuid(bytes)),
        other => other.clone(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
