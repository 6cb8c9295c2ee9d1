use chrono::{DateTime, NaiveDate, Utc};
use seedbank_hydrate::{DatabaseError, Row};
use sqlx::Row as _;
use sqlx::sqlite::{Sqlite, SqliteRow};

/// [`Row`] over an sqlx `SQLite` row.
///
/// Columns the query did not select read as `None`.
pub struct SqliteResultRow(SqliteRow);

impl std::fmt::Debug for SqliteResultRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteResultRow").finish_non_exhaustive()
    }
}

impl From<SqliteRow> for SqliteResultRow {
    fn from(row: SqliteRow) -> Self {
        Self(row)
    }
}

impl SqliteResultRow {
    fn decode<T>(&self, column: &str) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
    {
        match self.0.try_get::<Option<T>, _>(column) {
            Ok(value) => Ok(value),
            Err(sqlx::Error::ColumnNotFound(_)) => Ok(None),
            Err(err) => Err(DatabaseError::with_source(
                format!("cannot read column '{column}'"),
                err,
            )),
        }
    }

    fn is_type_mismatch(&self, column: &str) -> bool {
        matches!(
            self.0.try_get::<Option<String>, _>(column),
            Err(sqlx::Error::ColumnDecode { .. })
        )
    }
}

impl Row for SqliteResultRow {
    fn get_i64(&self, column: &str) -> Result<Option<i64>, DatabaseError> {
        self.decode(column)
    }

    fn get_string(&self, column: &str) -> Result<Option<String>, DatabaseError> {
        if !self.is_type_mismatch(column) {
            return self.decode(column);
        }
        if let Ok(value) = self.0.try_get::<Option<i64>, _>(column) {
            return Ok(value.map(|v| v.to_string()));
        }
        Ok(self.decode::<f64>(column)?.map(|v| v.to_string()))
    }

    fn get_f64(&self, column: &str) -> Result<Option<f64>, DatabaseError> {
        match self.0.try_get::<Option<f64>, _>(column) {
            Err(sqlx::Error::ColumnDecode { .. }) => {
                Ok(self.decode::<i64>(column)?.map(int_to_f64))
            }
            _ => self.decode(column),
        }
    }

    fn get_bool(&self, column: &str) -> Result<Option<bool>, DatabaseError> {
        self.decode(column)
    }

    fn get_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        self.decode(column)
    }

    fn get_date(&self, column: &str) -> Result<Option<NaiveDate>, DatabaseError> {
        self.decode(column)
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_to_f64(v: i64) -> f64 {
    v as f64
}
