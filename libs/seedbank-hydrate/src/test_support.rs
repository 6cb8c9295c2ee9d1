//! Small entity graph used by the unit tests: `Sample -> Crop`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use seedbank_security::SecurityContext;

use crate::{
    Database, DatabaseError, Entity, Extras, HydrateError, HydrateResult, Id, Insertable, Manager,
    Mapped, MemoryRow, ObjectCache, Parser, Ref, Row, SqlValue, decode_enum, impl_entity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropKind {
    Cereal,
    Legume,
}

impl CropKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "cereal" => Some(Self::Cereal),
            "legume" => Some(Self::Legume),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Crop {
    pub id: Option<Id>,
    pub name: String,
    pub kind: Option<CropKind>,
    pub extra: Extras,
}

impl_entity!(Crop, kind = "crop", id_column = "crops.id");

impl Crop {
    pub fn new(id: Option<Id>, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl Mapped for Crop {
    const TABLE: &'static str = "crops";
    const COLUMNS: &'static [&'static str] = &["crops.id", "crops.name", "crops.kind"];
}

pub struct CropParser;

#[async_trait]
impl Parser<Crop> for CropParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        _ctx: &SecurityContext,
        _eager: bool,
    ) -> HydrateResult<Option<Crop>> {
        let Some(id) = row.get_i64("crops.id")? else {
            return Ok(None);
        };
        let kind = decode_enum(Crop::KIND, "crops.kind", row.get_string("crops.kind")?, |s| {
            CropKind::from_name(s)
        })?;
        Ok(Some(Crop {
            id: Some(id),
            name: row.get_string("crops.name")?.unwrap_or_default(),
            kind,
            extra: Extras::default(),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Sample {
    pub id: Option<Id>,
    pub label: String,
    pub crop: Option<Ref<Crop>>,
    pub extra: Extras,
}

impl_entity!(Sample, kind = "sample", id_column = "samples.id");

impl Mapped for Sample {
    const TABLE: &'static str = "samples";
    const COLUMNS: &'static [&'static str] = &["samples.id", "samples.label", "samples.crop_id"];
}

impl Insertable for Sample {
    const INSERT_COLUMNS: &'static [&'static str] = &["samples.label", "samples.crop_id"];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        let crop = self
            .crop
            .as_ref()
            .ok_or_else(|| HydrateError::Precondition {
                kind: Self::KIND,
                reason: "crop is required".to_owned(),
            })?
            .id()
            .ok_or_else(|| HydrateError::Precondition {
                kind: Self::KIND,
                reason: "crop has not been saved".to_owned(),
            })?;
        Ok(vec![self.label.as_str().into(), crop.into()])
    }
}

pub struct SampleParser {
    pub crops: Arc<ObjectCache<Crop>>,
}

#[async_trait]
impl Parser<Sample> for SampleParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<Sample>> {
        let Some(id) = row.get_i64("samples.id")? else {
            return Ok(None);
        };
        let crop = self
            .crops
            .get(ctx, row.get_i64("samples.crop_id")?, row, eager)
            .await?;
        Ok(Some(Sample {
            id: Some(id),
            label: row.get_string("samples.label")?.unwrap_or_default(),
            crop,
            extra: Extras::default(),
        }))
    }
}

/// Call-counting crop manager with a revocable deny list.
#[derive(Default)]
pub struct CropStore {
    crops: HashMap<Id, Crop>,
    denied: Mutex<HashSet<Id>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CropStore {
    pub fn with_crops(crops: impl IntoIterator<Item = Crop>) -> Self {
        Self {
            crops: crops.into_iter().filter_map(|c| Some((c.id?, c))).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_denied(self, id: Id) -> Self {
        self.deny(id);
        self
    }

    pub fn deny(&self, id: Id) {
        self.denied.lock().unwrap().insert(id);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, id: Id) -> HydrateResult<()> {
        if self.denied.lock().unwrap().contains(&id) {
            return Err(HydrateError::AccessDenied {
                kind: Crop::KIND,
                id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Manager<Crop> for CropStore {
    async fn get_by_id(&self, _ctx: &SecurityContext, id: Id) -> HydrateResult<Option<Crop>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check(id)?;
        Ok(self.crops.get(&id).cloned())
    }

    fn authorize(&self, _ctx: &SecurityContext, entity: &Crop) -> HydrateResult<()> {
        entity.id().map_or(Ok(()), |id| self.check(id))
    }
}

type Statement = (String, Vec<SqlValue>);

/// Database double: serves a fixed row set and records every insert.
#[derive(Default)]
pub struct RecordingDatabase {
    rows: Vec<MemoryRow>,
    next_id: AtomicI64,
    statements: Mutex<Vec<Statement>>,
    batches: AtomicUsize,
    fetches: AtomicUsize,
    fail: bool,
}

impl RecordingDatabase {
    pub fn starting_at(first_id: Id) -> Self {
        Self {
            next_id: AtomicI64::new(first_id),
            ..Self::default()
        }
    }

    pub fn with_rows(rows: Vec<MemoryRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.fail {
            return Err(DatabaseError::new("database unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    type Row = MemoryRow;

    async fn fetch_all(
        &self,
        _sql: &str,
        _params: Vec<SqlValue>,
    ) -> Result<Vec<MemoryRow>, DatabaseError> {
        self.check()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.clone())
    }

    async fn insert(&self, sql: &str, params: Vec<SqlValue>) -> Result<Id, DatabaseError> {
        self.check()?;
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_owned(), params));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn insert_batch(
        &self,
        sql: &str,
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<Vec<Id>, DatabaseError> {
        self.check()?;
        self.batches.fetch_add(1, Ordering::SeqCst);
        let mut statements = self.statements.lock().unwrap();
        Ok(rows
            .into_iter()
            .map(|params| {
                statements.push((sql.to_owned(), params));
                self.next_id.fetch_add(1, Ordering::SeqCst)
            })
            .collect())
    }
}
