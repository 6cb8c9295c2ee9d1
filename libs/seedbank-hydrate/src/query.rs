use seedbank_security::SecurityContext;
use tracing::debug;

use crate::database::Database;
use crate::entity::Entity;
use crate::error::HydrateResult;
use crate::parser::Parser;
use crate::projection::{Projected, ProjectingParser, Projection};
use crate::row::SqlValue;

/// Run a root query and parse every row. Denied and malformed rows are
/// omitted; a storage failure aborts the whole query.
///
/// # Errors
/// Storage failures.
pub async fn fetch_objects<E, D>(
    db: &D,
    parser: &dyn Parser<E>,
    sql: &str,
    params: Vec<SqlValue>,
    ctx: &SecurityContext,
    eager: bool,
) -> HydrateResult<Vec<E>>
where
    E: Entity,
    D: Database + ?Sized,
{
    let rows = db.fetch_all(sql, params).await?;
    let mut objects = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(object) = parser.parse(row, ctx, eager).await? {
            objects.push(object);
        }
    }
    debug!(
        kind = E::KIND,
        fetched = rows.len(),
        returned = objects.len(),
        "root query parsed"
    );
    Ok(objects)
}

/// [`fetch_objects`] for a projecting parser.
///
/// # Errors
/// Storage failures.
pub async fn fetch_projected<E, X, D>(
    db: &D,
    parser: &ProjectingParser<E, X>,
    sql: &str,
    params: Vec<SqlValue>,
    ctx: &SecurityContext,
    eager: bool,
) -> HydrateResult<Vec<Projected<E, X>>>
where
    E: Entity,
    X: Projection,
    D: Database + ?Sized,
{
    let rows = db.fetch_all(sql, params).await?;
    let mut objects = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(object) = parser.parse(row, ctx, eager).await? {
            objects.push(object);
        }
    }
    Ok(objects)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{Crop, CropParser, CropStore, RecordingDatabase, Sample, SampleParser};
    use crate::{CacheSettings, ManagerRef, MemoryRow, ObjectCache};

    #[tokio::test]
    async fn denied_rows_and_rows_without_keys_are_omitted() {
        let store = Arc::new(CropStore::with_crops([Crop::new(Some(1), "barley")]).with_denied(2));
        let manager: ManagerRef<Crop> = Arc::clone(&store) as ManagerRef<Crop>;
        let crops = Arc::new(ObjectCache::<Crop>::new(
            Arc::new(CropParser),
            manager,
            &CacheSettings::default(),
        ));
        let parser = SampleParser { crops };
        let db = RecordingDatabase::with_rows(vec![
            MemoryRow::new().with("samples.id", 1_i64).with("samples.crop_id", 1_i64),
            MemoryRow::new().with("samples.id", 2_i64).with("samples.crop_id", 2_i64),
            MemoryRow::new().with("samples.id", 3_i64),
            MemoryRow::new().with("samples.label", "no id"),
        ]);

        let samples = fetch_objects::<Sample, _>(
            &db,
            &parser,
            "SELECT ...",
            Vec::new(),
            &SecurityContext::anonymous(),
            false,
        )
        .await
        .unwrap();

        let ids: Vec<_> = samples.iter().filter_map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(db.fetches(), 1);
    }

    #[tokio::test]
    async fn storage_failure_aborts_the_query() {
        let db = RecordingDatabase::failing();

        let result = fetch_objects::<Crop, _>(
            &db,
            &CropParser,
            "SELECT ...",
            Vec::new(),
            &SecurityContext::anonymous(),
            false,
        )
        .await;

        assert!(result.is_err());
    }
}
