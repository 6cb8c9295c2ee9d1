use std::sync::Arc;

use async_trait::async_trait;
use seedbank_security::SecurityContext;
use tracing::{debug, warn};

use crate::entity::Entity;
use crate::error::{HydrateError, HydrateResult};
use crate::manager::ManagerRef;
use crate::row::Row;

pub type ParserRef<E> = Arc<dyn Parser<E>>;

/// Hydrates one entity type from a [`Row`].
///
/// Implementors write [`Parser::map_row`]; callers pick the level of error
/// absorption they need:
///
/// | method | `AccessDenied` | `Malformed` / `MissingReference` | `Storage` |
/// |---|---|---|---|
/// | `map_row` | propagates | propagates | propagates |
/// | `hydrate` | propagates | absent | propagates |
/// | `parse` | absent | absent | propagates |
///
/// Caches resolve references with `hydrate`, so a denial anywhere in the
/// graph reaches the root `parse` and drops the whole row, while bad data
/// only drops the entity that carries it.
///
/// A parser issues no queries of its own; all I/O goes through the
/// [`crate::ObjectCache`]s it holds.
#[async_trait]
pub trait Parser<E: Entity>: Send + Sync {
    /// Map `row` onto an entity. Returns `Ok(None)` when the row carries no
    /// primary key for `E` (no match, or an empty outer join).
    ///
    /// `eager` tells reference lookups whether the referenced tables were
    /// joined into `row`.
    ///
    /// # Errors
    /// Any [`HydrateError`].
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<E>>;

    /// [`Parser::map_row`], with data-integrity failures turned into an
    /// absent entity.
    ///
    /// # Errors
    /// Access denials and storage failures.
    async fn hydrate(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<E>> {
        match self.map_row(row, ctx, eager).await {
            Err(err) if err.is_data_integrity() => {
                warn!(kind = E::KIND, error = %err, "dropping malformed entity");
                Ok(None)
            }
            other => other,
        }
    }

    /// Root entry point: [`Parser::hydrate`], with an access denial anywhere
    /// in the graph turned into an absent result for the whole row.
    ///
    /// # Errors
    /// Storage failures only.
    async fn parse(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<E>> {
        match self.hydrate(row, ctx, eager).await {
            Err(HydrateError::AccessDenied { kind, id }) => {
                debug!(root = E::KIND, kind, id, "row omitted: access denied");
                Ok(None)
            }
            other => other,
        }
    }
}

/// Applies the manager's access check to the root entity itself, so that a
/// listing query omits rows the caller may not view.
pub struct GuardedParser<E: Entity> {
    inner: ParserRef<E>,
    manager: ManagerRef<E>,
}

impl<E: Entity> GuardedParser<E> {
    #[must_use]
    pub fn new(inner: ParserRef<E>, manager: ManagerRef<E>) -> Self {
        Self { inner, manager }
    }
}

#[async_trait]
impl<E: Entity> Parser<E> for GuardedParser<E> {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<E>> {
        let Some(entity) = self.inner.map_row(row, ctx, eager).await? else {
            return Ok(None);
        };
        self.manager.authorize(ctx, &entity)?;
        Ok(Some(entity))
    }
}
