use async_trait::async_trait;

use crate::entity::{Entity, Id};
use crate::error::{DatabaseError, HydrateResult};
use crate::row::{Row, SqlValue};

/// The statement executor behind managers, loaders and writers.
///
/// Statements use positional `?` parameters bound from `params` in order.
#[async_trait]
pub trait Database: Send + Sync {
    type Row: Row + 'static;

    /// Run a query and materialize every row.
    ///
    /// # Errors
    /// Any execution or decoding failure.
    async fn fetch_all(
        &self,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<Self::Row>, DatabaseError>;

    /// Run an `INSERT` and return the generated key.
    ///
    /// # Errors
    /// Any execution failure.
    async fn insert(&self, sql: &str, params: Vec<SqlValue>) -> Result<Id, DatabaseError>;

    /// Run one `INSERT` statement once per parameter row, atomically, and
    /// return the generated keys in the same order.
    ///
    /// # Errors
    /// Any execution failure; no row of the batch is kept.
    async fn insert_batch(
        &self,
        sql: &str,
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<Vec<Id>, DatabaseError>;
}

/// Static table mapping of an entity.
pub trait Mapped: Entity {
    const TABLE: &'static str;
    /// Table-qualified columns selected for this entity.
    const COLUMNS: &'static [&'static str];
}

/// An entity that can be written with a [`crate::Writer`].
pub trait Insertable: Mapped {
    /// Table-qualified columns of the `INSERT`, in bind order. The primary
    /// key is generated and never listed.
    const INSERT_COLUMNS: &'static [&'static str];

    /// Values for [`Insertable::INSERT_COLUMNS`], in order. Optional
    /// references bind as `NULL`.
    ///
    /// # Errors
    /// [`crate::HydrateError::Precondition`] when a required reference is
    /// absent or unsaved.
    fn bind(&self) -> HydrateResult<Vec<SqlValue>>;
}
