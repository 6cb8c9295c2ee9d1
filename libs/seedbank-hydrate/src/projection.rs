//! Computed columns attached to an entity for one query shape.
//!
//! When the set of computed columns is known, wrap the entity in a typed
//! [`Projected`]; [`ExtraColumns`] copies an arbitrary column list into the
//! entity's [`crate::Extras`] bag for the genuinely dynamic cases.

use std::marker::PhantomData;

use async_trait::async_trait;
use seedbank_security::SecurityContext;

use crate::entity::Entity;
use crate::error::HydrateResult;
use crate::parser::{Parser, ParserRef};
use crate::row::Row;

/// Typed reader for the computed columns of one query shape.
pub trait Projection: Sized + Send + Sync + 'static {
    /// # Errors
    /// Storage failures while reading the computed columns.
    fn read(row: &dyn Row) -> HydrateResult<Self>;
}

/// `COUNT(..) AS count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Count(pub i64);

impl Projection for Count {
    fn read(row: &dyn Row) -> HydrateResult<Self> {
        Ok(Self(row.get_i64("count")?.unwrap_or_default()))
    }
}

/// `AVG(..) AS avg`; `None` when there was nothing to average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Average(pub Option<f64>);

impl Projection for Average {
    fn read(row: &dyn Row) -> HydrateResult<Self> {
        Ok(Self(row.get_f64("avg")?))
    }
}

/// `... AS distance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance(pub Option<f64>);

impl Projection for Distance {
    fn read(row: &dyn Row) -> HydrateResult<Self> {
        Ok(Self(row.get_f64("distance")?))
    }
}

/// An entity together with the computed columns of the row it came from.
#[derive(Debug, Clone)]
pub struct Projected<E, X> {
    pub entity: E,
    pub projection: X,
}

/// Root parser producing [`Projected`] values.
pub struct ProjectingParser<E: Entity, X> {
    inner: ParserRef<E>,
    _projection: PhantomData<fn() -> X>,
}

impl<E: Entity, X: Projection> ProjectingParser<E, X> {
    #[must_use]
    pub fn new(inner: ParserRef<E>) -> Self {
        Self {
            inner,
            _projection: PhantomData,
        }
    }

    /// Root parse of the entity, then the projection columns.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn parse(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<Projected<E, X>>> {
        let Some(entity) = self.inner.parse(row, ctx, eager).await? else {
            return Ok(None);
        };
        Ok(Some(Projected {
            entity,
            projection: X::read(row)?,
        }))
    }
}

/// Copies the listed columns, when non-null, into the extras bag.
pub struct ExtraColumns<E: Entity> {
    inner: ParserRef<E>,
    columns: Vec<String>,
}

impl<E: Entity> ExtraColumns<E> {
    #[must_use]
    pub fn new(inner: ParserRef<E>, columns: Vec<String>) -> Self {
        Self { inner, columns }
    }
}

#[async_trait]
impl<E: Entity> Parser<E> for ExtraColumns<E> {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<E>> {
        let Some(mut entity) = self.inner.map_row(row, ctx, eager).await? else {
            return Ok(None);
        };
        for column in &self.columns {
            if let Some(value) = row.get_string(column)? {
                entity.set_extra(column.as_str(), value);
            }
        }
        Ok(Some(entity))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::MemoryRow;
    use crate::test_support::{Crop, CropParser};

    fn crop_row() -> MemoryRow {
        MemoryRow::new()
            .with("crops.id", 1_i64)
            .with("crops.name", "barley")
    }

    #[tokio::test]
    async fn typed_projection_reads_computed_column() {
        let parser = ProjectingParser::<Crop, Count>::new(Arc::new(CropParser));
        let row = crop_row().with("count", 12_i64);

        let projected = parser
            .parse(&row, &SecurityContext::anonymous(), false)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(projected.entity.name, "barley");
        assert_eq!(projected.projection, Count(12));
        assert!(projected.entity.extras().is_empty());
    }

    #[tokio::test]
    async fn average_of_nothing_is_none() {
        let parser = ProjectingParser::<Crop, Average>::new(Arc::new(CropParser));

        let projected = parser
            .parse(&crop_row(), &SecurityContext::anonymous(), false)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(projected.projection, Average(None));
    }

    #[tokio::test]
    async fn distance_reads_integer_cells() {
        let parser = ProjectingParser::<Crop, Distance>::new(Arc::new(CropParser));
        let row = crop_row().with("distance", 3_i64);

        let projected = parser
            .parse(&row, &SecurityContext::anonymous(), false)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(projected.projection, Distance(Some(3.0)));
    }

    #[tokio::test]
    async fn extra_columns_fill_the_bag() {
        let parser = ExtraColumns::<Crop>::new(
            Arc::new(CropParser),
            vec!["distance".to_owned(), "synonyms".to_owned()],
        );
        let row = crop_row().with("distance", 2.5).with("synonyms", "bere");

        let crop = parser
            .parse(&row, &SecurityContext::anonymous(), false)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(crop.extra("distance"), Some("2.5"));
        assert_eq!(crop.extra("synonyms"), Some("bere"));
        assert_eq!(crop, Crop::new(Some(1), "barley"));
    }
}
