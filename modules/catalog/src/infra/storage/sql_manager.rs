use std::sync::Arc;

use async_trait::async_trait;
use seedbank_hydrate::{
    Database, HydrateError, HydrateResult, Id, Manager, Mapped, ParserRef, SqlValue, sql,
};
use seedbank_security::{PolicyRef, SecurityContext};
use tracing::{debug, trace};

/// Per-type predicate on a hydrated entity, applied after the policy check.
pub type Visibility<E> = fn(&SecurityContext, &E) -> bool;

/// Fetches single entities by id and decides whether a caller may view them.
///
/// Access is granted when the policy allows `(E::KIND, id)` and, if set, the
/// visibility predicate accepts the hydrated entity.
pub struct SqlManager<E: Mapped, D: Database> {
    db: Arc<D>,
    policy: PolicyRef,
    parser: ParserRef<E>,
    select_by_id: String,
    visibility: Option<Visibility<E>>,
}

impl<E: Mapped, D: Database> SqlManager<E, D> {
    #[must_use]
    pub fn new(db: Arc<D>, policy: PolicyRef, parser: ParserRef<E>) -> Self {
        Self {
            db,
            policy,
            parser,
            select_by_id: sql::select_by_id::<E>(),
            visibility: None,
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility<E>) -> Self {
        self.visibility = Some(visibility);
        self
    }

    fn check_policy(&self, ctx: &SecurityContext, id: Id) -> HydrateResult<()> {
        if self.policy.can_view(ctx, E::KIND, id) {
            Ok(())
        } else {
            debug!(kind = E::KIND, id, "denied by policy");
            Err(HydrateError::AccessDenied { kind: E::KIND, id })
        }
    }

    fn check_visibility(&self, ctx: &SecurityContext, id: Id, entity: &E) -> HydrateResult<()> {
        match self.visibility {
            Some(visible) if !visible(ctx, entity) => {
                debug!(kind = E::KIND, id, "hidden from caller");
                Err(HydrateError::AccessDenied { kind: E::KIND, id })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<E, D> Manager<E> for SqlManager<E, D>
where
    E: Mapped,
    D: Database + 'static,
{
    async fn get_by_id(&self, ctx: &SecurityContext, id: Id) -> HydrateResult<Option<E>> {
        self.check_policy(ctx, id)?;
        let rows = self
            .db
            .fetch_all(&self.select_by_id, vec![SqlValue::Int(id)])
            .await?;
        let Some(row) = rows.first() else {
            trace!(kind = E::KIND, id, "not found");
            return Ok(None);
        };
        let Some(entity) = self.parser.hydrate(row, ctx, false).await? else {
            return Ok(None);
        };
        self.check_visibility(ctx, id, &entity)?;
        Ok(Some(entity))
    }

    /// Unsaved entities have nothing to deny access to.
    fn authorize(&self, ctx: &SecurityContext, entity: &E) -> HydrateResult<()> {
        let Some(id) = entity.id() else {
            return Ok(());
        };
        self.check_policy(ctx, id)?;
        self.check_visibility(ctx, id, entity)
    }
}
