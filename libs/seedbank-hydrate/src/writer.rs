use std::marker::PhantomData;

use tracing::debug;

use crate::database::{Database, Insertable};
use crate::entity::Id;
use crate::error::{DatabaseError, HydrateError, HydrateResult};
use crate::row::SqlValue;
use crate::sql::insert_sql;

fn bind_checked<E: Insertable>(entity: &E) -> HydrateResult<Vec<SqlValue>> {
    if entity.id().is_some() {
        return Err(HydrateError::Precondition {
            kind: E::KIND,
            reason: "entity has already been saved".to_owned(),
        });
    }
    let values = entity.bind()?;
    if values.len() != E::INSERT_COLUMNS.len() {
        return Err(HydrateError::Precondition {
            kind: E::KIND,
            reason: format!(
                "bound {} values for {} columns",
                values.len(),
                E::INSERT_COLUMNS.len()
            ),
        });
    }
    Ok(values)
}

/// Inserts one entity at a time and writes the generated id back.
pub struct Writer<E> {
    sql: String,
    _entity: PhantomData<fn(&mut E)>,
}

impl<E: Insertable> Default for Writer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Insertable> Writer<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sql: insert_sql(E::TABLE, E::INSERT_COLUMNS),
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Insert `entity` and set its id to the generated key.
    ///
    /// # Errors
    /// [`HydrateError::Precondition`] when the entity cannot be bound;
    /// [`HydrateError::Storage`] when the insert fails. The entity is left
    /// untouched on error.
    pub async fn write<D: Database + ?Sized>(&self, db: &D, entity: &mut E) -> HydrateResult<Id> {
        let values = bind_checked(entity)?;
        let id = db.insert(&self.sql, values).await?;
        entity.set_id(id);
        debug!(kind = E::KIND, id, "inserted");
        Ok(id)
    }
}

/// Writer for imports: one statement text, many parameter rows, executed
/// together.
pub struct BatchedWriter<E> {
    sql: String,
    _entity: PhantomData<fn(&mut E)>,
}

impl<E: Insertable> Default for BatchedWriter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Insertable> BatchedWriter<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sql: insert_sql(E::TABLE, E::INSERT_COLUMNS),
            _entity: PhantomData,
        }
    }

    /// Start a batch. The batch borrows every entity added to it until it is
    /// executed, which is when ids are written back.
    #[must_use]
    pub fn batch<'e>(&self) -> BatchStatement<'e, E> {
        BatchStatement {
            sql: self.sql.clone(),
            rows: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Insert all of `entities` as one batch.
    ///
    /// # Errors
    /// As [`BatchStatement::add`] and [`BatchStatement::execute`]; nothing is
    /// written when any entity fails to bind.
    pub async fn write_all<D: Database + ?Sized>(
        &self,
        db: &D,
        entities: &mut [E],
    ) -> HydrateResult<Vec<Id>> {
        let mut batch = self.batch();
        for entity in entities.iter_mut() {
            batch.add(entity)?;
        }
        batch.execute(db).await
    }
}

/// An open batch. Owned by one import at a time; `add` and `execute` need
/// exclusive access.
pub struct BatchStatement<'e, E> {
    sql: String,
    rows: Vec<Vec<SqlValue>>,
    targets: Vec<&'e mut E>,
}

impl<'e, E: Insertable> BatchStatement<'e, E> {
    /// Bind `entity` positionally and queue it.
    ///
    /// # Errors
    /// [`HydrateError::Precondition`] when the entity cannot be bound; the
    /// batch is unchanged.
    pub fn add(&mut self, entity: &'e mut E) -> HydrateResult<()> {
        let values = bind_checked(entity)?;
        self.rows.push(values);
        self.targets.push(entity);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Execute the batch and assign generated ids in insertion order.
    ///
    /// # Errors
    /// [`HydrateError::Storage`] when the batch fails or the database returns
    /// a different number of keys than rows were queued.
    pub async fn execute<D: Database + ?Sized>(self, db: &D) -> HydrateResult<Vec<Id>> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }
        let expected = self.rows.len();
        let ids = db.insert_batch(&self.sql, self.rows).await?;
        if ids.len() != expected {
            return Err(DatabaseError::new(format!(
                "batch insert returned {} keys for {expected} rows",
                ids.len()
            ))
            .into());
        }
        for (target, id) in self.targets.into_iter().zip(&ids) {
            target.set_id(*id);
        }
        debug!(kind = E::KIND, rows = expected, "batch inserted");
        Ok(ids)
    }
}
