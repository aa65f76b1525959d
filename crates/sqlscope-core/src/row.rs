//! Result rows.
//!
//! A row is an ordered tuple of [`Value`]s in selection order; positional
//! access is the guaranteed interface. When the driver supplies column names
//! the row also answers name lookups, through a [`ColumnInfo`] shared by
//! every row of the result set.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use std::sync::Arc;

/// Column names for one result set, shared across its rows via `Arc`.
///
/// Lookup is a linear scan; result sets rarely carry more than a handful of
/// columns and the scan keeps the struct a single allocation.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    names: Vec<String>,
}

impl ColumnInfo {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Column info for a row with no column names (positional-only access).
    pub fn unnamed() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of the column called `name`, if there is one.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// One fetched row.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Build a row against shared column metadata.
    ///
    /// Drivers create one `ColumnInfo` per result set and hand the same
    /// `Arc` to every row they produce.
    pub fn new(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Build a row of bare values with no column names.
    ///
    /// Canned mock rows use this; name lookups on such a row always miss.
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            values,
            columns: ColumnInfo::unnamed(),
        }
    }

    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, in selection order.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the column called `name`, when names are available.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.get(self.columns.index_of(name)?)
    }

    /// Value at `index`, converted to `T`.
    #[allow(clippy::result_large_err)]
    pub fn get_as<T: FromValue>(&self, index: usize) -> Result<T> {
        match self.get(index) {
            Some(value) => T::from_value(value),
            None => Err(conversion_error::<T>(&format!(
                "index {index} out of bounds (row has {} values)",
                self.len()
            ))),
        }
    }

    /// Value of the column called `name`, converted to `T`.
    #[allow(clippy::result_large_err)]
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let Some(value) = self.get_by_name(name) else {
            return Err(tag_column(
                conversion_error::<T>(&format!("column '{name}' not found")),
                name,
            ));
        };
        T::from_value(value).map_err(|err| tag_column(err, name))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.names().iter().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Consume the row, yielding its values in order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

fn conversion_error<T>(actual: &str) -> Error {
    Error::Type(TypeError {
        expected: std::any::type_name::<T>(),
        actual: actual.to_string(),
        column: None,
    })
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: value.type_name().to_string(),
        column: None,
    })
}

fn tag_column(mut err: Error, name: &str) -> Error {
    if let Error::Type(te) = &mut err {
        te.column = Some(name.to_string());
    }
    err
}

/// Conversion out of a fetched [`Value`].
pub trait FromValue: Sized {
    #[allow(clippy::result_large_err)]
    fn from_value(value: &Value) -> Result<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| mismatch("i64", value))
    }
}

/// Narrowing integer conversions go through i64 and range-check.
macro_rules! narrow_int_from_value {
    ($($ty:ty),+) => {$(
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self> {
                let wide = i64::from_value(value)
                    .map_err(|_| mismatch(stringify!($ty), value))?;
                <$ty>::try_from(wide).map_err(|_| {
                    conversion_error::<$ty>(&format!("value {wide} out of range"))
                })
            }
        }
    )+};
}

narrow_int_from_value!(i32, u32);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch("String", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch("Vec<u8>", other)),
        }
    }
}

impl FromValue for [u8; 16] {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Uuid(v) => Ok(*v),
            Value::Bytes(v) => {
                <[u8; 16]>::try_from(v.as_slice()).map_err(|_| mismatch("UUID (16 bytes)", value))
            }
            other => Err(mismatch("UUID (16 bytes)", other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(s) => serde_json::from_str(s)
                .map_err(|e| conversion_error::<serde_json::Value>(&format!("invalid JSON: {e}"))),
            other => Err(mismatch("JSON", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}
