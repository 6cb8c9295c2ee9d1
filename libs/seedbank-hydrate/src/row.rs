use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{DatabaseError, HydrateError};

/// One query result, addressed by (table-qualified) column name.
///
/// Every accessor is nullable. A column that the query did not select reads
/// as `None`, exactly like a SQL `NULL`: a parser run against a row that was
/// not joined with its table simply finds no primary key.
pub trait Row: Send + Sync {
    /// # Errors
    /// Returns [`DatabaseError`] when the cell cannot be decoded as an integer.
    fn get_i64(&self, column: &str) -> Result<Option<i64>, DatabaseError>;

    /// Numeric cells are rendered as text.
    ///
    /// # Errors
    /// Returns [`DatabaseError`] when the cell cannot be decoded.
    fn get_string(&self, column: &str) -> Result<Option<String>, DatabaseError>;

    /// # Errors
    /// Returns [`DatabaseError`] when the cell cannot be decoded as a float.
    fn get_f64(&self, column: &str) -> Result<Option<f64>, DatabaseError>;

    /// # Errors
    /// Returns [`DatabaseError`] when the cell cannot be decoded as a boolean.
    fn get_bool(&self, column: &str) -> Result<Option<bool>, DatabaseError>;

    /// # Errors
    /// Returns [`DatabaseError`] when the cell cannot be decoded as a timestamp.
    fn get_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, DatabaseError>;

    /// # Errors
    /// Returns [`DatabaseError`] when the cell cannot be decoded as a date.
    fn get_date(&self, column: &str) -> Result<Option<NaiveDate>, DatabaseError>;
}

/// A value bound to a statement parameter, or held by a [`MemoryRow`].
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl SqlValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Date(_) => "date",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Date(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// In-memory [`Row`], used for synthetic rows and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRow {
    cells: BTreeMap<String, SqlValue>,
}

impl MemoryRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.cells.insert(column.to_owned(), value.into());
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<SqlValue>) {
        self.cells.insert(column.to_owned(), value.into());
    }

    fn cell(&self, column: &str) -> Option<&SqlValue> {
        self.cells.get(column).filter(|v| !v.is_null())
    }

    fn mismatch(column: &str, expected: &str, found: &SqlValue) -> DatabaseError {
        DatabaseError::new(format!(
            "column '{column}': expected {expected}, found {}",
            found.type_name()
        ))
    }
}

impl Row for MemoryRow {
    fn get_i64(&self, column: &str) -> Result<Option<i64>, DatabaseError> {
        match self.cell(column) {
            None => Ok(None),
            Some(SqlValue::Int(v)) => Ok(Some(*v)),
            Some(SqlValue::Bool(v)) => Ok(Some(i64::from(*v))),
            Some(other) => Err(Self::mismatch(column, "int", other)),
        }
    }

    fn get_string(&self, column: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.cell(column).map(ToString::to_string))
    }

    fn get_f64(&self, column: &str) -> Result<Option<f64>, DatabaseError> {
        match self.cell(column) {
            None => Ok(None),
            Some(SqlValue::Float(v)) => Ok(Some(*v)),
            Some(SqlValue::Int(v)) => Ok(Some(int_to_f64(*v))),
            Some(other) => Err(Self::mismatch(column, "float", other)),
        }
    }

    fn get_bool(&self, column: &str) -> Result<Option<bool>, DatabaseError> {
        match self.cell(column) {
            None => Ok(None),
            Some(SqlValue::Bool(v)) => Ok(Some(*v)),
            Some(SqlValue::Int(v)) => Ok(Some(*v != 0)),
            Some(other) => Err(Self::mismatch(column, "bool", other)),
        }
    }

    fn get_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        match self.cell(column) {
            None => Ok(None),
            Some(SqlValue::Timestamp(v)) => Ok(Some(*v)),
            Some(other) => Err(Self::mismatch(column, "timestamp", other)),
        }
    }

    fn get_date(&self, column: &str) -> Result<Option<NaiveDate>, DatabaseError> {
        match self.cell(column) {
            None => Ok(None),
            Some(SqlValue::Date(v)) => Ok(Some(*v)),
            Some(other) => Err(Self::mismatch(column, "date", other)),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_to_f64(v: i64) -> f64 {
    v as f64
}

/// Maps a nullable code column onto a closed enumeration.
///
/// `NULL` yields `Ok(None)`; an unrecognized code yields
/// [`HydrateError::Malformed`] for `kind`.
///
/// # Errors
/// Returns [`HydrateError::Malformed`] when `decode` rejects the value.
pub fn decode_enum<V, T>(
    kind: &'static str,
    column: &'static str,
    value: Option<V>,
    decode: impl FnOnce(&V) -> Option<T>,
) -> Result<Option<T>, HydrateError>
where
    V: fmt::Display,
{
    match value {
        None => Ok(None),
        Some(raw) => decode(&raw)
            .map(Some)
            .ok_or_else(|| HydrateError::malformed(kind, column, raw)),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn missing_and_null_columns_read_as_none() {
        let row = MemoryRow::new().with("t.a", SqlValue::Null);
        assert_eq!(row.get_i64("t.a").unwrap(), None);
        assert_eq!(row.get_i64("t.b").unwrap(), None);
        assert_eq!(row.get_string("t.b").unwrap(), None);
    }

    #[test]
    fn strings_render_numbers() {
        let row = MemoryRow::new().with("t.n", 42_i64).with("t.f", 1.5);
        assert_eq!(row.get_string("t.n").unwrap().as_deref(), Some("42"));
        assert_eq!(row.get_string("t.f").unwrap().as_deref(), Some("1.5"));
    }

    #[test]
    fn type_mismatch_is_a_storage_error() {
        let row = MemoryRow::new().with("t.a", "abc");
        let err = row.get_i64("t.a").unwrap_err();
        assert!(err.message().contains("expected int"));
    }

    #[test]
    fn options_bind_as_null() {
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".to_owned()));
    }

    #[test]
    fn decode_enum_distinguishes_null_from_unknown() {
        let decode = |v: &i64| (*v == 1).then_some("one");
        assert_eq!(decode_enum("k", "c", None, decode).unwrap(), None);
        assert_eq!(decode_enum("k", "c", Some(1), decode).unwrap(), Some("one"));
        let err = decode_enum("k", "c", Some(7), decode).unwrap_err();
        assert!(err.is_data_integrity());
    }
}
