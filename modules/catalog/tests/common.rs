#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use seedbank_catalog::Catalog;
use seedbank_catalog::domain::{
    Accession, Attribute, AttributeData, AttributeTarget, AttributeType, Country, Dataset,
    DatasetState, Experiment, Institution, License, Location, LocationType, ParentRole, Pedigree,
};
use seedbank_catalog::infra::storage::SCHEMA;
use seedbank_db::{DbConfig, SqliteDatabase, SqliteResultRow};
use seedbank_hydrate::{Database, DatabaseError, Entity, HydrateConfig, Id, Ref, SqlValue};
use seedbank_security::{AllowAll, PolicyRef, SecurityContext};

pub const OWNER: i64 = 7;
pub const OTHER_USER: i64 = 8;

/// `SQLite` database that records every query it runs.
pub struct CountingDatabase {
    inner: SqliteDatabase,
    queries: Mutex<Vec<String>>,
}

impl CountingDatabase {
    pub async fn memory() -> Arc<Self> {
        let inner = SqliteDatabase::connect(&DbConfig {
            max_conns: Some(1),
            ..DbConfig::default()
        })
        .await
        .unwrap();
        inner.execute_script(SCHEMA).await.unwrap();
        Arc::new(Self {
            inner,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub async fn execute(&self, script: &str) {
        self.inner.execute_script(script).await.unwrap();
    }

    /// Single-entity fetches a manager ran against `table`.
    pub fn by_id_fetches(&self, table: &str) -> usize {
        let needle = format!("FROM {table} WHERE {table}.id = ?");
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|sql| sql.contains(&needle))
            .count()
    }

    pub fn queries(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    /// Queries whose text contains `fragment`.
    pub fn queries_containing(&self, fragment: &str) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|sql| sql.contains(fragment))
            .count()
    }

    pub fn reset(&self) {
        self.queries.lock().unwrap().clear();
    }
}

#[async_trait]
impl Database for CountingDatabase {
    type Row = SqliteResultRow;

    async fn fetch_all(
        &self,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<SqliteResultRow>, DatabaseError> {
        self.queries.lock().unwrap().push(sql.to_owned());
        self.inner.fetch_all(sql, params).await
    }

    async fn insert(&self, sql: &str, params: Vec<SqlValue>) -> Result<Id, DatabaseError> {
        self.inner.insert(sql, params).await
    }

    async fn insert_batch(
        &self,
        sql: &str,
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<Vec<Id>, DatabaseError> {
        self.inner.insert_batch(sql, rows).await
    }
}

pub fn catalog(db: &Arc<CountingDatabase>, policy: PolicyRef) -> Catalog<CountingDatabase> {
    Catalog::new(Arc::clone(db), policy, &HydrateConfig::default())
}

pub fn admin() -> SecurityContext {
    SecurityContext::builder()
        .subject_id(1)
        .username("curator")
        .admin(true)
        .build()
}

pub fn user(id: i64) -> SecurityContext {
    SecurityContext::builder().subject_id(id).build()
}

/// Ids of the seeded catalogue.
pub struct Seed {
    pub peru: Id,
    pub ethiopia: Id,
    pub cip: Id,
    pub ilri: Id,
    pub huancayo: Id,
    pub debre_zeit: Id,
    pub license: Id,
    pub trial: Id,
    pub public_dataset: Id,
    pub private_dataset: Id,
    pub hidden_dataset: Id,
    pub height: Id,
    pub curator: Id,
    pub potato: Id,
    pub teff: Id,
}

fn saved<E: Entity + Clone>(entity: &E) -> Ref<E> {
    Ref::full(entity.clone())
}

/// Two countries, two institutions, two locations, one license, one
/// experiment, three datasets (public with license, private to [`OWNER`],
/// hidden), two attributes, two accessions. The public dataset belongs to
/// the experiment, has metadata counts and carries one curator value. The
/// potato accession is its own female parent and carries one height value.
pub async fn seed(db: &Arc<CountingDatabase>) -> Seed {
    let catalog = catalog(db, Arc::new(AllowAll));

    let mut peru = Country {
        name: "Peru".to_owned(),
        code2: Some("PE".to_owned()),
        code3: Some("PER".to_owned()),
        ..Country::default()
    };
    let mut ethiopia = Country {
        name: "Ethiopia".to_owned(),
        code2: Some("ET".to_owned()),
        code3: Some("ETH".to_owned()),
        ..Country::default()
    };
    catalog.insert(&mut peru).await.unwrap();
    catalog.insert(&mut ethiopia).await.unwrap();

    let mut cip = Institution {
        code: Some("PER001".to_owned()),
        name: "International Potato Center".to_owned(),
        acronym: Some("CIP".to_owned()),
        country: Some(saved(&peru)),
        ..Institution::default()
    };
    let mut ilri = Institution {
        code: Some("ETH013".to_owned()),
        name: "International Livestock Research Institute".to_owned(),
        acronym: Some("ILRI".to_owned()),
        country: Some(saved(&ethiopia)),
        ..Institution::default()
    };
    catalog.insert(&mut cip).await.unwrap();
    catalog.insert(&mut ilri).await.unwrap();

    let mut huancayo = Location {
        country: Some(saved(&peru)),
        location_type: Some(LocationType::CollectingSite),
        site_name: Some("Huancayo".to_owned()),
        elevation: Some(3259.0),
        latitude: Some(-12.07),
        longitude: Some(-75.21),
        ..Location::default()
    };
    let mut debre_zeit = Location {
        country: Some(saved(&ethiopia)),
        location_type: Some(LocationType::Trials),
        site_name: Some("Debre Zeit".to_owned()),
        elevation: Some(1900.0),
        ..Location::default()
    };
    catalog.insert(&mut huancayo).await.unwrap();
    catalog.insert(&mut debre_zeit).await.unwrap();

    let mut license = License {
        name: "CC-BY-4.0".to_owned(),
        description: Some("Attribution required".to_owned()),
        ..License::default()
    };
    catalog.insert(&mut license).await.unwrap();

    let mut trial = Experiment {
        date: chrono::NaiveDate::from_ymd_opt(2021, 3, 1),
        ..Experiment::new("Potato yield trial 2021")
    };
    catalog.insert(&mut trial).await.unwrap();

    let mut public_dataset = Dataset {
        name: "Potato trials".to_owned(),
        experiment: Some(saved(&trial)),
        location: Some(saved(&huancayo)),
        license: Some(saved(&license)),
        state: DatasetState::Public,
        date_start: chrono::NaiveDate::from_ymd_opt(2021, 3, 1),
        ..Dataset::default()
    };
    let mut private_dataset = Dataset {
        name: "Owner notes".to_owned(),
        state: DatasetState::Private,
        created_by: Some(OWNER),
        ..Dataset::default()
    };
    let mut hidden_dataset = Dataset {
        name: "Embargoed".to_owned(),
        state: DatasetState::Hidden,
        created_by: Some(OWNER),
        ..Dataset::default()
    };
    catalog.insert(&mut public_dataset).await.unwrap();
    catalog.insert(&mut private_dataset).await.unwrap();
    catalog.insert(&mut hidden_dataset).await.unwrap();
    db.execute(&format!(
        "INSERT INTO datasetmeta (dataset_id, nr_of_data_objects, nr_of_data_points) \
         VALUES ({}, 2, 40)",
        public_dataset.id().unwrap()
    ))
    .await;

    let mut height = Attribute::new("Plant height", AttributeType::Float);
    height.target_table = Some(Attribute::TARGET_ACCESSIONS.to_owned());
    let mut curator = Attribute::new("Curator", AttributeType::Char);
    curator.target_table = Some(Attribute::TARGET_DATASETS.to_owned());
    catalog.insert(&mut height).await.unwrap();
    catalog.insert(&mut curator).await.unwrap();

    let mut potato = Accession {
        name: Some("Yungay".to_owned()),
        institution: Some(saved(&cip)),
        location: Some(saved(&huancayo)),
        ..Accession::new("CIP-380389.1")
    };
    let mut teff = Accession {
        name: Some("Quncho".to_owned()),
        institution: Some(saved(&ilri)),
        location: Some(saved(&debre_zeit)),
        ..Accession::new("ETH-T-114")
    };
    catalog.insert(&mut potato).await.unwrap();
    catalog.insert(&mut teff).await.unwrap();

    let mut selfing = Pedigree::new(saved(&potato), saved(&potato), ParentRole::Female);
    catalog.insert(&mut selfing).await.unwrap();

    let mut values = vec![
        AttributeData::new(
            saved(&height),
            AttributeTarget::Accession(saved(&potato)),
            "45.2",
        ),
        AttributeData::new(
            saved(&curator),
            AttributeTarget::Dataset(saved(&public_dataset)),
            "J. Doe",
        ),
    ];
    catalog.import_attribute_data(&mut values).await.unwrap();

    Seed {
        peru: peru.id().unwrap(),
        ethiopia: ethiopia.id().unwrap(),
        cip: cip.id().unwrap(),
        ilri: ilri.id().unwrap(),
        huancayo: huancayo.id().unwrap(),
        debre_zeit: debre_zeit.id().unwrap(),
        license: license.id().unwrap(),
        trial: trial.id().unwrap(),
        public_dataset: public_dataset.id().unwrap(),
        private_dataset: private_dataset.id().unwrap(),
        hidden_dataset: hidden_dataset.id().unwrap(),
        height: height.id().unwrap(),
        curator: curator.id().unwrap(),
        potato: potato.id().unwrap(),
        teff: teff.id().unwrap(),
    }
}
