use std::sync::Arc;

use async_trait::async_trait;
use seedbank_security::SecurityContext;

use crate::entity::{Entity, Id};
use crate::error::HydrateResult;

pub type ManagerRef<E> = Arc<dyn Manager<E>>;

/// Authoritative per-id fetch with access check, used by an
/// [`crate::ObjectCache`] when a referenced entity is not in the current row.
#[async_trait]
pub trait Manager<E: Entity>: Send + Sync {
    /// Fetch one entity.
    ///
    /// # Errors
    /// [`crate::HydrateError::AccessDenied`] when `ctx` may not view `id`;
    /// [`crate::HydrateError::Storage`] on any lower-level fault.
    async fn get_by_id(&self, ctx: &SecurityContext, id: Id) -> HydrateResult<Option<E>>;

    /// Access check for an entity obtained without [`Manager::get_by_id`]:
    /// parsed from a joined row, or served from a cache.
    ///
    /// # Errors
    /// [`crate::HydrateError::AccessDenied`] when `ctx` may not view `entity`.
    fn authorize(&self, ctx: &SecurityContext, entity: &E) -> HydrateResult<()> {
        let _ = (ctx, entity);
        Ok(())
    }
}
