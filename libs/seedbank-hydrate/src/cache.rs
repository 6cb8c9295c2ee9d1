//! Memoizing, permission-checking resolution of foreign-key references.

use std::sync::Arc;

use moka::future::Cache;
use seedbank_security::{AccessScope, SecurityContext};
use tracing::{debug, trace};

use crate::config::CacheSettings;
use crate::entity::{Entity, Id, Ref};
use crate::error::{HydrateError, HydrateResult};
use crate::manager::ManagerRef;
use crate::parser::ParserRef;
use crate::row::Row;

/// Entries are per principal scope: a value loaded for one caller is never
/// served to a caller with different entitlements.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    id: Id,
    scope: AccessScope,
}

/// Outcome of a load that must not be memoized.
enum Miss {
    Absent,
    Failed(HydrateError),
}

/// Shared front door to one entity type's [`crate::Manager`] and
/// [`crate::Parser`].
///
/// Concurrent misses for the same key are coalesced into a single load.
/// Absent results and errors (including denials) are never stored.
pub struct ObjectCache<E: Entity> {
    memo: Option<Cache<CacheKey, Arc<E>>>,
    revalidate_hits: bool,
    parser: ParserRef<E>,
    manager: ManagerRef<E>,
}

impl<E: Entity> ObjectCache<E> {
    #[must_use]
    pub fn new(parser: ParserRef<E>, manager: ManagerRef<E>, settings: &CacheSettings) -> Self {
        let memo = settings.enabled.then(|| {
            let mut builder =
                Cache::<CacheKey, Arc<E>>::builder().max_capacity(settings.max_entries);
            if let Some(ttl) = settings.ttl {
                builder = builder.time_to_live(ttl);
            }
            builder.build()
        });
        Self {
            memo,
            revalidate_hits: settings.revalidate_hits,
            parser,
            manager,
        }
    }

    /// The parser used for eager resolution.
    #[must_use]
    pub fn parser(&self) -> &ParserRef<E> {
        &self.parser
    }

    /// The manager used for lazy resolution and access checks.
    #[must_use]
    pub fn manager(&self) -> &ManagerRef<E> {
        &self.manager
    }

    /// Resolve a foreign-key reference.
    ///
    /// An absent `id` returns `Ok(None)` without touching the cache or the
    /// manager. With `eager` set, the entity is parsed out of `row` when the
    /// row carries its primary key with the same id, and is then
    /// access-checked and memoized exactly as a fetched one would be. Any
    /// other case goes through [`crate::Manager::get_by_id`].
    ///
    /// # Errors
    /// [`HydrateError::AccessDenied`] when `ctx` may not view the entity;
    /// [`HydrateError::Storage`] on fetch failures.
    pub async fn get(
        &self,
        ctx: &SecurityContext,
        id: Option<Id>,
        row: &dyn Row,
        eager: bool,
    ) -> HydrateResult<Option<Ref<E>>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let from_row = eager && row.get_i64(E::ID_COLUMN)? == Some(id);

        let Some(memo) = &self.memo else {
            let entity = self.resolve(ctx, id, row, from_row).await?;
            return Ok(entity.map(Ref::Full));
        };

        let key = CacheKey {
            id,
            scope: ctx.access_scope(),
        };
        if let Some(hit) = memo.get(&key).await {
            if self.revalidate_hits {
                self.manager.authorize(ctx, &hit)?;
            }
            trace!(kind = E::KIND, id, "cache hit");
            return Ok(Some(Ref::Full(hit)));
        }

        let loaded = memo
            .try_get_with(key, async {
                match self.resolve(ctx, id, row, from_row).await {
                    Ok(Some(entity)) => Ok(entity),
                    Ok(None) => Err(Miss::Absent),
                    Err(err) => Err(Miss::Failed(err)),
                }
            })
            .await;

        match loaded {
            Ok(entity) => Ok(Some(Ref::Full(entity))),
            Err(miss) => match miss.as_ref() {
                Miss::Absent => Ok(None),
                Miss::Failed(err) => Err(err.clone()),
            },
        }
    }

    /// [`ObjectCache::get`] for a reference the owning entity cannot exist
    /// without. An unresolvable reference becomes
    /// [`HydrateError::MissingReference`] for `owner`.
    ///
    /// # Errors
    /// As [`ObjectCache::get`], plus `MissingReference`.
    pub async fn get_required(
        &self,
        ctx: &SecurityContext,
        id: Option<Id>,
        row: &dyn Row,
        eager: bool,
        owner: &'static str,
        column: &'static str,
    ) -> HydrateResult<Ref<E>> {
        self.get(ctx, id, row, eager)
            .await?
            .ok_or(HydrateError::MissingReference {
                kind: owner,
                column,
            })
    }

    /// Drop every memoized entry.
    pub fn clear(&self) {
        if let Some(memo) = &self.memo {
            memo.invalidate_all();
            debug!(kind = E::KIND, "cache cleared");
        }
    }

    async fn resolve(
        &self,
        ctx: &SecurityContext,
        id: Id,
        row: &dyn Row,
        from_row: bool,
    ) -> HydrateResult<Option<Arc<E>>> {
        let entity = if from_row {
            trace!(kind = E::KIND, id, "hydrating from joined row");
            let entity = self.parser.hydrate(row, ctx, true).await?;
            if let Some(entity) = &entity {
                self.manager.authorize(ctx, entity)?;
            }
            entity
        } else {
            debug!(kind = E::KIND, id, "fetching by id");
            self.manager.get_by_id(ctx, id).await?
        };
        Ok(entity.map(Arc::new))
    }
}
