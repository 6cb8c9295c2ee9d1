//! Minimal/full parsing.
//!
//! A full parser first builds the shallow parent with its minimal parser,
//! then loads child collections by the parent's id and attaches them. The
//! children's back-reference to the parent is built as [`crate::Ref::Stub`]
//! by the loader's own parser, so a full parse never re-enters itself.

use std::sync::Arc;

use async_trait::async_trait;
use seedbank_security::SecurityContext;

use crate::entity::{Entity, Id};
use crate::error::HydrateResult;
use crate::parser::{Parser, ParserRef};
use crate::row::Row;

/// Loads the children of one parent. Children the caller may not view are
/// omitted by the loader, not reported.
#[async_trait]
pub trait ChildLoader<C>: Send + Sync {
    /// # Errors
    /// Storage failures; a denial that covers the whole collection.
    async fn load(&self, ctx: &SecurityContext, parent_id: Id) -> HydrateResult<Vec<C>>;
}

pub type Attach<E, C> = fn(&mut E, Vec<C>);

/// Decorates a minimal parser with one attached child collection.
pub struct FullParser<E: Entity, C> {
    minimal: ParserRef<E>,
    children: Arc<dyn ChildLoader<C>>,
    attach: Attach<E, C>,
}

impl<E: Entity, C> FullParser<E, C> {
    #[must_use]
    pub fn new(
        minimal: ParserRef<E>,
        children: Arc<dyn ChildLoader<C>>,
        attach: Attach<E, C>,
    ) -> Self {
        Self {
            minimal,
            children,
            attach,
        }
    }
}

#[async_trait]
impl<E, C> Parser<E> for FullParser<E, C>
where
    E: Entity,
    C: Send + Sync + 'static,
{
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<E>> {
        let Some(mut entity) = self.minimal.map_row(row, ctx, eager).await? else {
            return Ok(None);
        };
        if let Some(id) = entity.id() {
            let children = self.children.load(ctx, id).await?;
            (self.attach)(&mut entity, children);
        }
        Ok(Some(entity))
    }
}
