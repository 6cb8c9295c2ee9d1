//! Composition root: every object cache is built once, bottom-up, and shared
//! by all parsers that resolve references of its type.

use std::sync::Arc;

use chrono::Utc;
use seedbank_hydrate::{
    Average, BatchedWriter, Count, Database, FullParser, GuardedParser, HydrateConfig,
    HydrateResult, Id, Insertable, Mapped, MemoryRow, ObjectCache, ParserRef, Projected,
    ProjectingParser, Ref, SqlValue, Writer, fetch_objects, fetch_projected, sql,
};
use seedbank_security::{ANONYMOUS_SUBJECT_ID, PolicyRef, SecurityContext};
use tracing::{debug, info};

use crate::domain::accession::attach_pedigrees;
use crate::domain::dataset::{attach_attribute_data, dataset_visible};
use crate::domain::license::attach_logs;
use crate::domain::{
    Accession, AccessionParser, Attribute, AttributeData, AttributeDataParser, AttributeParser,
    Country, CountryParser, Dataset, DatasetParser, Experiment, ExperimentParser, Institution,
    InstitutionParser, License, LicenseLog, LicenseLogParser, LicenseParser, Location,
    LocationParser, Pedigree, PedigreeParser,
};
use crate::infra::storage::{SqlChildLoader, SqlManager, Visibility};

/// The shared caches, one per referenced entity type.
pub struct Caches {
    pub countries: Arc<ObjectCache<Country>>,
    pub institutions: Arc<ObjectCache<Institution>>,
    pub locations: Arc<ObjectCache<Location>>,
    pub experiments: Arc<ObjectCache<Experiment>>,
    pub licenses: Arc<ObjectCache<License>>,
    pub datasets: Arc<ObjectCache<Dataset>>,
    pub attributes: Arc<ObjectCache<Attribute>>,
    pub accessions: Arc<ObjectCache<Accession>>,
}

impl Caches {
    fn clear(&self) {
        self.countries.clear();
        self.institutions.clear();
        self.locations.clear();
        self.experiments.clear();
        self.licenses.clear();
        self.datasets.clear();
        self.attributes.clear();
        self.accessions.clear();
    }
}

/// Root parsers. Every listing parser is guarded by its type's manager, so
/// rows the caller may not view are omitted. Full parsers check the root
/// before they load any children.
pub struct Parsers {
    pub country: ParserRef<Country>,
    pub institution: ParserRef<Institution>,
    pub accession: ParserRef<Accession>,
    pub accession_full: ParserRef<Accession>,
    pub dataset: ParserRef<Dataset>,
    pub dataset_full: ParserRef<Dataset>,
    pub pedigree: ParserRef<Pedigree>,
    pub accession_attribute_data: ParserRef<AttributeData>,
    pub dataset_attribute_data: ParserRef<AttributeData>,
}

pub struct Catalog<D: Database> {
    db: Arc<D>,
    caches: Caches,
    parsers: Parsers,
}

fn object_cache<E, D>(
    db: &Arc<D>,
    policy: &PolicyRef,
    config: &HydrateConfig,
    parser: ParserRef<E>,
    visibility: Option<Visibility<E>>,
) -> Arc<ObjectCache<E>>
where
    E: Mapped,
    D: Database + 'static,
{
    let mut manager = SqlManager::new(Arc::clone(db), Arc::clone(policy), Arc::clone(&parser));
    if let Some(visibility) = visibility {
        manager = manager.with_visibility(visibility);
    }
    Arc::new(ObjectCache::new(
        parser,
        Arc::new(manager),
        config.settings_for(E::KIND),
    ))
}

fn guarded<E: Mapped>(parser: &ParserRef<E>, cache: &ObjectCache<E>) -> ParserRef<E> {
    Arc::new(GuardedParser::new(
        Arc::clone(parser),
        Arc::clone(cache.manager()),
    ))
}

fn columns(tables: &[&[&'static str]]) -> String {
    sql::select_list(&tables.concat())
}

/// Attribute data of one target kind, joined with its attribute.
fn attribute_data_sql(target_table: &str) -> String {
    format!(
        "SELECT {} FROM attributedata \
         JOIN attributes ON attributes.id = attributedata.attribute_id \
         WHERE attributedata.foreign_id = ? AND attributes.target_table = '{target_table}' \
         ORDER BY attributedata.id",
        columns(&[AttributeData::COLUMNS, Attribute::COLUMNS]),
    )
}

impl<D: Database + 'static> Catalog<D> {
    /// Build every cache and parser. Caches resolve references with minimal
    /// parsers only; the license cache is the exception and always carries
    /// the caller's acceptance log, which is why it is keyed per caller.
    #[must_use]
    pub fn new(db: Arc<D>, policy: PolicyRef, config: &HydrateConfig) -> Self {
        let country: ParserRef<Country> = Arc::new(CountryParser);
        let countries = object_cache(&db, &policy, config, Arc::clone(&country), None);

        let institution: ParserRef<Institution> =
            Arc::new(InstitutionParser::new(Arc::clone(&countries)));
        let institutions = object_cache(&db, &policy, config, Arc::clone(&institution), None);

        let locations = object_cache::<Location, D>(
            &db,
            &policy,
            config,
            Arc::new(LocationParser::new(Arc::clone(&countries))),
            None,
        );

        let experiments = object_cache::<Experiment, D>(
            &db,
            &policy,
            config,
            Arc::new(ExperimentParser),
            None,
        );

        let license_logs = SqlChildLoader::<LicenseLog, D>::by_parent_and_user(
            Arc::clone(&db),
            Arc::new(LicenseLogParser),
            LicenseLog::LICENSE_ID,
            LicenseLog::USER_ID,
        );
        let licenses = object_cache::<License, D>(
            &db,
            &policy,
            config,
            Arc::new(FullParser::<License, LicenseLog>::new(
                Arc::new(LicenseParser),
                Arc::new(license_logs),
                attach_logs,
            )),
            None,
        );

        let dataset_minimal: ParserRef<Dataset> = Arc::new(DatasetParser::new(
            Arc::clone(&experiments),
            Arc::clone(&locations),
            Arc::clone(&licenses),
        ));
        let datasets = object_cache(
            &db,
            &policy,
            config,
            Arc::clone(&dataset_minimal),
            Some(dataset_visible as Visibility<Dataset>),
        );

        let attributes =
            object_cache::<Attribute, D>(&db, &policy, config, Arc::new(AttributeParser), None);

        let accession_minimal: ParserRef<Accession> = Arc::new(AccessionParser::new(
            Arc::clone(&institutions),
            Arc::clone(&locations),
        ));
        let accessions = object_cache(
            &db,
            &policy,
            config,
            Arc::clone(&accession_minimal),
            None,
        );

        let pedigree_children = SqlChildLoader::<Pedigree, D>::by_parent(
            Arc::clone(&db),
            Arc::new(PedigreeParser::non_recursive(Arc::clone(&accessions))),
            Pedigree::ACCESSION_ID,
        );
        let accession = guarded(&accession_minimal, &accessions);
        let accession_full: ParserRef<Accession> = Arc::new(FullParser::<Accession, Pedigree>::new(
            Arc::clone(&accession),
            Arc::new(pedigree_children),
            attach_pedigrees,
        ));

        let dataset_children = SqlChildLoader::<AttributeData, D>::new(
            Arc::clone(&db),
            Arc::new(AttributeDataParser::dataset_stub(Arc::clone(&attributes))),
            attribute_data_sql(Attribute::TARGET_DATASETS),
            |_, dataset_id| vec![SqlValue::Int(dataset_id)],
        )
        .eager();
        let dataset = guarded(&dataset_minimal, &datasets);
        let dataset_full: ParserRef<Dataset> = Arc::new(FullParser::<Dataset, AttributeData>::new(
            Arc::clone(&dataset),
            Arc::new(dataset_children),
            attach_attribute_data,
        ));

        let parsers = Parsers {
            country: guarded(&country, &countries),
            institution: guarded(&institution, &institutions),
            accession,
            accession_full,
            dataset,
            dataset_full,
            pedigree: Arc::new(PedigreeParser::new(Arc::clone(&accessions))),
            accession_attribute_data: Arc::new(AttributeDataParser::for_accessions(
                Arc::clone(&attributes),
                Arc::clone(&accessions),
            )),
            dataset_attribute_data: Arc::new(AttributeDataParser::for_datasets(
                Arc::clone(&attributes),
                Arc::clone(&datasets),
            )),
        };

        info!("catalog caches initialized");
        Self {
            db,
            caches: Caches {
                countries,
                institutions,
                locations,
                experiments,
                licenses,
                datasets,
                attributes,
                accessions,
            },
            parsers,
        }
    }

    #[must_use]
    pub fn database(&self) -> &Arc<D> {
        &self.db
    }

    #[must_use]
    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    #[must_use]
    pub fn parsers(&self) -> &Parsers {
        &self.parsers
    }

    /// Accessions by id, in id order, with their collecting location joined.
    /// Unknown ids and accessions the caller may not view are left out.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn accessions(
        &self,
        ctx: &SecurityContext,
        ids: &[Id],
        full: bool,
    ) -> HydrateResult<Vec<Accession>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM accessions \
             LEFT JOIN locations ON locations.id = accessions.location_id \
             LEFT JOIN countries ON countries.id = locations.country_id \
             WHERE accessions.id IN ({}) ORDER BY accessions.id",
            columns(&[Accession::COLUMNS, Location::COLUMNS, Country::COLUMNS]),
            sql::placeholders(ids.len()),
        );
        let params = ids.iter().copied().map(SqlValue::Int).collect();
        let parser = if full {
            &self.parsers.accession_full
        } else {
            &self.parsers.accession
        };
        fetch_objects(&*self.db, parser.as_ref(), &sql, params, ctx, true).await
    }

    /// Every dataset the caller may view, joined with its experiment,
    /// license, location and country. Data object and data point counts are
    /// filled from the dataset metadata.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn datasets(&self, ctx: &SecurityContext, full: bool) -> HydrateResult<Vec<Dataset>> {
        self.query_datasets(ctx, "", Vec::new(), full).await
    }

    /// # Errors
    /// Storage failures.
    pub async fn dataset(
        &self,
        ctx: &SecurityContext,
        id: Id,
        full: bool,
    ) -> HydrateResult<Option<Dataset>> {
        let mut found = self
            .query_datasets(ctx, "WHERE datasets.id = ?", vec![SqlValue::Int(id)], full)
            .await?;
        Ok(found.pop())
    }

    async fn query_datasets(
        &self,
        ctx: &SecurityContext,
        filter: &str,
        params: Vec<SqlValue>,
        full: bool,
    ) -> HydrateResult<Vec<Dataset>> {
        let sql = format!(
            "SELECT {}, \
             datasetmeta.nr_of_data_objects AS {}, datasetmeta.nr_of_data_points AS {} \
             FROM datasets \
             LEFT JOIN experiments ON experiments.id = datasets.experiment_id \
             LEFT JOIN licenses ON licenses.id = datasets.license_id \
             LEFT JOIN locations ON locations.id = datasets.location_id \
             LEFT JOIN countries ON countries.id = locations.country_id \
             LEFT JOIN datasetmeta ON datasetmeta.dataset_id = datasets.id \
             {filter} ORDER BY datasets.id",
            columns(&[
                Dataset::COLUMNS,
                Experiment::COLUMNS,
                License::COLUMNS,
                Location::COLUMNS,
                Country::COLUMNS,
            ]),
            Dataset::NR_OF_DATA_OBJECTS,
            Dataset::NR_OF_DATA_POINTS,
        );
        let parser = if full {
            &self.parsers.dataset_full
        } else {
            &self.parsers.dataset
        };
        fetch_objects(&*self.db, parser.as_ref(), &sql, params, ctx, true).await
    }

    /// Pedigree rows of one accession. The child accession is parsed from the
    /// joined columns, parents are resolved through the accession cache.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn pedigrees_of(
        &self,
        ctx: &SecurityContext,
        accession_id: Id,
    ) -> HydrateResult<Vec<Pedigree>> {
        let sql = format!(
            "SELECT {} FROM pedigrees \
             JOIN accessions ON accessions.id = pedigrees.accession_id \
             WHERE pedigrees.accession_id = ? ORDER BY pedigrees.id",
            columns(&[Pedigree::COLUMNS, Accession::COLUMNS]),
        );
        fetch_objects(
            &*self.db,
            self.parsers.pedigree.as_ref(),
            &sql,
            vec![SqlValue::Int(accession_id)],
            ctx,
            true,
        )
        .await
    }

    /// # Errors
    /// Storage failures.
    pub async fn attribute_data_for_accession(
        &self,
        ctx: &SecurityContext,
        accession_id: Id,
    ) -> HydrateResult<Vec<AttributeData>> {
        fetch_objects(
            &*self.db,
            self.parsers.accession_attribute_data.as_ref(),
            &attribute_data_sql(Attribute::TARGET_ACCESSIONS),
            vec![SqlValue::Int(accession_id)],
            ctx,
            true,
        )
        .await
    }

    /// # Errors
    /// Storage failures.
    pub async fn attribute_data_for_dataset(
        &self,
        ctx: &SecurityContext,
        dataset_id: Id,
    ) -> HydrateResult<Vec<AttributeData>> {
        fetch_objects(
            &*self.db,
            self.parsers.dataset_attribute_data.as_ref(),
            &attribute_data_sql(Attribute::TARGET_DATASETS),
            vec![SqlValue::Int(dataset_id)],
            ctx,
            true,
        )
        .await
    }

    /// Institutions with their country joined and the number of accessions
    /// they hold.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn institutions(
        &self,
        ctx: &SecurityContext,
    ) -> HydrateResult<Vec<Projected<Institution, Count>>> {
        let sql = format!(
            "SELECT {}, COUNT(accessions.id) AS count FROM institutions \
             LEFT JOIN countries ON countries.id = institutions.country_id \
             LEFT JOIN accessions ON accessions.institution_id = institutions.id \
             GROUP BY institutions.id ORDER BY institutions.id",
            columns(&[Institution::COLUMNS, Country::COLUMNS]),
        );
        let parser =
            ProjectingParser::<Institution, Count>::new(Arc::clone(&self.parsers.institution));
        fetch_projected(&*self.db, &parser, &sql, Vec::new(), ctx, true).await
    }

    /// Every country with the number of institutions located in it.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn countries_with_institution_counts(
        &self,
        ctx: &SecurityContext,
    ) -> HydrateResult<Vec<Projected<Country, Count>>> {
        let sql = format!(
            "SELECT {}, COUNT(institutions.id) AS count FROM countries \
             LEFT JOIN institutions ON institutions.country_id = countries.id \
             GROUP BY countries.id ORDER BY countries.id",
            columns(&[Country::COLUMNS]),
        );
        let parser = ProjectingParser::<Country, Count>::new(Arc::clone(&self.parsers.country));
        fetch_projected(&*self.db, &parser, &sql, Vec::new(), ctx, false).await
    }

    /// Every country with the average elevation of its locations, `None`
    /// when no location has one.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn countries_with_average_elevation(
        &self,
        ctx: &SecurityContext,
    ) -> HydrateResult<Vec<Projected<Country, Average>>> {
        let sql = format!(
            "SELECT {}, AVG(locations.elevation) AS avg FROM countries \
             LEFT JOIN locations ON locations.country_id = countries.id \
             GROUP BY countries.id ORDER BY countries.id",
            columns(&[Country::COLUMNS]),
        );
        let parser = ProjectingParser::<Country, Average>::new(Arc::clone(&self.parsers.country));
        fetch_projected(&*self.db, &parser, &sql, Vec::new(), ctx, false).await
    }

    /// Insert one entity and assign its generated id.
    ///
    /// # Errors
    /// Unsaved required references; storage failures.
    pub async fn insert<E: Insertable>(&self, entity: &mut E) -> HydrateResult<Id> {
        Writer::<E>::new().write(&*self.db, entity).await
    }

    /// Insert attribute values as one batch. Ids are assigned in slice order;
    /// nothing is written when any row cannot be bound.
    ///
    /// # Errors
    /// Unsaved attributes or targets; storage failures.
    pub async fn import_attribute_data(&self, data: &mut [AttributeData]) -> HydrateResult<Vec<Id>> {
        let ids = BatchedWriter::<AttributeData>::new()
            .write_all(&*self.db, data)
            .await?;
        info!(rows = ids.len(), "attribute data imported");
        Ok(ids)
    }

    /// Record that the caller accepted a license. Cached licenses and the
    /// datasets that reference them are dropped so the acceptance shows up
    /// on the next read.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn accept_license(
        &self,
        ctx: &SecurityContext,
        license_id: Id,
    ) -> HydrateResult<LicenseLog> {
        let mut log = LicenseLog {
            license_id,
            user_id: ctx.subject_id().unwrap_or(ANONYMOUS_SUBJECT_ID),
            accepted_on: Some(Utc::now()),
            ..LicenseLog::default()
        };
        self.insert(&mut log).await?;
        self.caches.licenses.clear();
        self.caches.datasets.clear();
        debug!(license_id, user_id = log.user_id, "license accepted");
        Ok(log)
    }

    /// One accession resolved through the shared cache, exactly as a
    /// reference to it would be.
    ///
    /// # Errors
    /// [`seedbank_hydrate::HydrateError::AccessDenied`]; storage failures.
    pub async fn cached_accession(
        &self,
        ctx: &SecurityContext,
        id: Id,
    ) -> HydrateResult<Option<Arc<Accession>>> {
        let resolved = self
            .caches
            .accessions
            .get(ctx, Some(id), &MemoryRow::new(), false)
            .await?;
        Ok(match resolved {
            Some(Ref::Full(accession)) => Some(accession),
            _ => None,
        })
    }

    /// Drop every memoized entity, e.g. after an import.
    pub fn clear_caches(&self) {
        self.caches.clear();
        debug!("catalog caches cleared");
    }
}
