use std::fmt;
use std::sync::Arc;

/// Database identity of an entity.
pub type Id = i64;

/// Ordered string bag for query-specific computed columns (counts, distances,
/// reference names) that are not part of an entity's static schema.
///
/// Never part of an entity's identity.
#[derive(Debug, Clone, Default)]
pub struct Extras {
    entries: Vec<(String, String)>,
}

impl Extras {
    /// Sets `key`; an existing key keeps its position and gets the new value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A typed value object mirroring one database record.
///
/// Implement through [`crate::impl_entity!`], which also provides identity
/// equality: two entities are equal iff both ids are present and equal.
pub trait Entity: fmt::Debug + Send + Sync + 'static {
    /// Short lowercase name used in access checks, logs and errors.
    const KIND: &'static str;
    /// Table-qualified primary-key column, e.g. `"datasets.id"`.
    const ID_COLUMN: &'static str;

    fn id(&self) -> Option<Id>;
    fn set_id(&mut self, id: Id);
    fn extras(&self) -> &Extras;
    fn extras_mut(&mut self) -> &mut Extras;

    fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>)
    where
        Self: Sized,
    {
        self.extras_mut().set(key, value);
    }

    fn extra(&self, key: &str) -> Option<&str> {
        self.extras().get(key)
    }
}

/// Identity equality shared by every entity type.
#[must_use]
pub fn same_identity<E: Entity>(a: &E, b: &E) -> bool {
    matches!((a.id(), b.id()), (Some(x), Some(y)) if x == y)
}

/// Ids of a slice of entities, skipping unsaved ones.
#[must_use]
pub fn entity_ids<E: Entity>(entities: &[E]) -> Vec<Id> {
    entities.iter().filter_map(E::id).collect()
}

/// Implements [`Entity`] and identity `PartialEq` for a struct with
/// `id: Option<Id>` and `extra: Extras` fields.
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty, kind = $kind:literal, id_column = $col:expr) => {
        impl $crate::Entity for $ty {
            const KIND: &'static str = $kind;
            const ID_COLUMN: &'static str = $col;

            fn id(&self) -> Option<$crate::Id> {
                self.id
            }

            fn set_id(&mut self, id: $crate::Id) {
                self.id = Some(id);
            }

            fn extras(&self) -> &$crate::Extras {
                &self.extra
            }

            fn extras_mut(&mut self) -> &mut $crate::Extras {
                &mut self.extra
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::entity::same_identity(self, other)
            }
        }
    };
}

/// A resolved reference to another entity.
///
/// `Stub` carries only the id; it is what a non-recursive parser produces for
/// a back-reference to the parent it is being attached to. `Full` is a
/// hydrated entity, shared with the cache that produced it.
pub enum Ref<E> {
    Stub(Id),
    Full(Arc<E>),
}

impl<E: Entity> Ref<E> {
    #[must_use]
    pub fn full(entity: E) -> Self {
        Self::Full(Arc::new(entity))
    }

    /// Id of the referenced entity; `None` only for a `Full` entity that has
    /// not been saved yet.
    #[must_use]
    pub fn id(&self) -> Option<Id> {
        match self {
            Self::Stub(id) => Some(*id),
            Self::Full(entity) => entity.id(),
        }
    }

    /// The hydrated entity, if this is not a stub.
    #[must_use]
    pub fn get(&self) -> Option<&E> {
        match self {
            Self::Stub(_) => None,
            Self::Full(entity) => Some(entity),
        }
    }

    #[must_use]
    pub fn is_stub(&self) -> bool {
        matches!(self, Self::Stub(_))
    }
}

impl<E> Clone for Ref<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Stub(id) => Self::Stub(*id),
            Self::Full(entity) => Self::Full(Arc::clone(entity)),
        }
    }
}

impl<E: Entity> fmt::Debug for Ref<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stub(id) => f.debug_tuple("Stub").field(id).finish(),
            Self::Full(entity) => f.debug_tuple("Full").field(entity).finish(),
        }
    }
}

impl<E: Entity> PartialEq for Ref<E> {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id(), other.id()), (Some(a), Some(b)) if a == b)
    }
}

/// Id of an optional reference, as written to a nullable foreign-key column.
#[must_use]
pub fn ref_id<E: Entity>(reference: Option<&Ref<E>>) -> Option<Id> {
    reference.and_then(Ref::id)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::test_support::Crop;

    #[test]
    fn extras_keep_insertion_order_and_replace_in_place() {
        let mut extras = Extras::default();
        extras.set("count", "3");
        extras.set("avg", "1.5");
        extras.set("count", "4");

        let entries: Vec<_> = extras.iter().collect();
        assert_eq!(entries, vec![("count", "4"), ("avg", "1.5")]);
        assert_eq!(extras.get("missing"), None);
    }

    #[test]
    fn equality_is_by_present_id_only() {
        let a = Crop::new(Some(1), "barley");
        let mut b = Crop::new(Some(1), "wheat");
        b.set_extra("count", "10");
        let unsaved = Crop::new(None, "barley");

        assert_eq!(a, b);
        assert_ne!(a, Crop::new(Some(2), "barley"));
        assert_ne!(unsaved, unsaved.clone());
    }

    #[test]
    fn refs_compare_by_id() {
        let stub: Ref<Crop> = Ref::Stub(5);
        let full = Ref::full(Crop::new(Some(5), "oat"));

        assert_eq!(stub, full);
        assert!(stub.is_stub());
        assert_eq!(full.get().map(|c| c.name.as_str()), Some("oat"));
        assert_eq!(ref_id(Some(&full)), Some(5));
        assert_eq!(ref_id::<Crop>(None), None);
    }

    #[test]
    fn ids_skip_unsaved() {
        let crops = vec![
            Crop::new(Some(1), "a"),
            Crop::new(None, "b"),
            Crop::new(Some(3), "c"),
        ];
        assert_eq!(entity_ids(&crops), vec![1, 3]);
    }
}
