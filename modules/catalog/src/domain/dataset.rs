use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use seedbank_hydrate::{
    Entity, Extras, HydrateError, HydrateResult, Id, Insertable, Mapped, ObjectCache, Parser, Ref,
    Row, SqlValue, decode_enum, impl_entity, ref_id,
};
use seedbank_security::{ANONYMOUS_SUBJECT_ID, SecurityContext};

use super::attribute_data::AttributeData;
use super::experiment::Experiment;
use super::license::License;
use super::location::Location;

/// Publication state of a dataset. Closed set, stored by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DatasetState {
    #[default]
    Public,
    Private,
    Hidden,
}

impl DatasetState {
    #[must_use]
    pub fn id(self) -> i64 {
        match self {
            Self::Public => 1,
            Self::Private => 2,
            Self::Hidden => 3,
        }
    }

    #[must_use]
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Public),
            2 => Some(Self::Private),
            3 => Some(Self::Hidden),
            _ => None,
        }
    }
}

/// A collection of measurements or passport data.
///
/// `attribute_data` is `None` after a minimal parse and `Some` after a full
/// one, even when the dataset has no attribute rows. `size` and
/// `data_points` are only filled by queries that join the dataset metadata.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub id: Option<Id>,
    pub experiment: Option<Ref<Experiment>>,
    pub location: Option<Ref<Location>>,
    pub license: Option<Ref<License>>,
    pub name: String,
    pub description: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub source_file: Option<String>,
    pub datatype: Option<String>,
    pub contact: Option<String>,
    pub version: Option<String>,
    pub created_by: Option<i64>,
    pub state: DatasetState,
    pub is_external: Option<bool>,
    pub hyperlink: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    /// Number of data objects (markers, traits, ...) in the dataset.
    pub size: Option<i64>,
    pub data_points: Option<i64>,
    pub attribute_data: Option<Vec<AttributeData>>,
    pub extra: Extras,
}

impl_entity!(Dataset, kind = "dataset", id_column = Dataset::ID);

impl Dataset {
    pub const ID: &'static str = "datasets.id";
    pub const EXPERIMENT_ID: &'static str = "datasets.experiment_id";
    pub const LOCATION_ID: &'static str = "datasets.location_id";
    pub const LICENSE_ID: &'static str = "datasets.license_id";
    pub const NAME: &'static str = "datasets.name";
    pub const DESCRIPTION: &'static str = "datasets.description";
    pub const DATE_START: &'static str = "datasets.date_start";
    pub const DATE_END: &'static str = "datasets.date_end";
    pub const SOURCE_FILE: &'static str = "datasets.source_file";
    pub const DATATYPE: &'static str = "datasets.datatype";
    pub const CONTACT: &'static str = "datasets.contact";
    pub const VERSION: &'static str = "datasets.version";
    pub const CREATED_BY: &'static str = "datasets.created_by";
    pub const DATASET_STATE_ID: &'static str = "datasets.dataset_state_id";
    pub const IS_EXTERNAL: &'static str = "datasets.is_external";
    pub const HYPERLINK: &'static str = "datasets.hyperlink";
    pub const CREATED_ON: &'static str = "datasets.created_on";
    pub const UPDATED_ON: &'static str = "datasets.updated_on";

    /// Computed by dataset queries that join `datasetmeta`.
    pub const NR_OF_DATA_OBJECTS: &'static str = "nr_of_data_objects";
    pub const NR_OF_DATA_POINTS: &'static str = "nr_of_data_points";

    /// Whether `ctx` may export this dataset without accepting its license
    /// first. A license reference that was not hydrated counts as not
    /// accepted.
    #[must_use]
    pub fn has_license_been_accepted(&self, ctx: &SecurityContext) -> bool {
        let Some(license) = &self.license else {
            return true;
        };
        let user_id = ctx.subject_id().unwrap_or(ANONYMOUS_SUBJECT_ID);
        license.get().is_some_and(|l| l.accepted_by(user_id))
    }

    /// Public datasets are visible to everyone, private ones to their
    /// creator, hidden ones to administrators only.
    #[must_use]
    pub fn is_visible_to(&self, ctx: &SecurityContext) -> bool {
        if ctx.is_admin() {
            return true;
        }
        match self.state {
            DatasetState::Public => true,
            DatasetState::Private => {
                self.created_by.is_some() && self.created_by == ctx.subject_id()
            }
            DatasetState::Hidden => false,
        }
    }
}

impl Mapped for Dataset {
    const TABLE: &'static str = "datasets";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::EXPERIMENT_ID,
        Self::LOCATION_ID,
        Self::LICENSE_ID,
        Self::NAME,
        Self::DESCRIPTION,
        Self::DATE_START,
        Self::DATE_END,
        Self::SOURCE_FILE,
        Self::DATATYPE,
        Self::CONTACT,
        Self::VERSION,
        Self::CREATED_BY,
        Self::DATASET_STATE_ID,
        Self::IS_EXTERNAL,
        Self::HYPERLINK,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for Dataset {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::EXPERIMENT_ID,
        Self::LOCATION_ID,
        Self::LICENSE_ID,
        Self::NAME,
        Self::DESCRIPTION,
        Self::DATE_START,
        Self::DATE_END,
        Self::SOURCE_FILE,
        Self::DATATYPE,
        Self::CONTACT,
        Self::VERSION,
        Self::CREATED_BY,
        Self::DATASET_STATE_ID,
        Self::IS_EXTERNAL,
        Self::HYPERLINK,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            ref_id(self.experiment.as_ref()).into(),
            ref_id(self.location.as_ref()).into(),
            ref_id(self.license.as_ref()).into(),
            self.name.as_str().into(),
            self.description.clone().into(),
            self.date_start.into(),
            self.date_end.into(),
            self.source_file.clone().into(),
            self.datatype.clone().into(),
            self.contact.clone().into(),
            self.version.clone().into(),
            self.created_by.into(),
            self.state.id().into(),
            self.is_external.into(),
            self.hyperlink.clone().into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

pub struct DatasetParser {
    experiments: Arc<ObjectCache<Experiment>>,
    locations: Arc<ObjectCache<Location>>,
    licenses: Arc<ObjectCache<License>>,
}

impl DatasetParser {
    #[must_use]
    pub fn new(
        experiments: Arc<ObjectCache<Experiment>>,
        locations: Arc<ObjectCache<Location>>,
        licenses: Arc<ObjectCache<License>>,
    ) -> Self {
        Self {
            experiments,
            locations,
            licenses,
        }
    }
}

/// Reads a computed count that only some queries select. Undecodable cells
/// are treated like missing ones.
fn optional_count(row: &dyn Row, column: &str) -> Option<i64> {
    row.get_i64(column).ok().flatten()
}

#[async_trait]
impl Parser<Dataset> for DatasetParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<Dataset>> {
        let Some(id) = row.get_i64(Dataset::ID)? else {
            return Ok(None);
        };
        let state = decode_enum(
            Dataset::KIND,
            Dataset::DATASET_STATE_ID,
            row.get_i64(Dataset::DATASET_STATE_ID)?,
            |raw| DatasetState::from_id(*raw),
        )?
        .ok_or_else(|| HydrateError::malformed(Dataset::KIND, Dataset::DATASET_STATE_ID, "NULL"))?;
        let experiment = self
            .experiments
            .get(ctx, row.get_i64(Dataset::EXPERIMENT_ID)?, row, eager)
            .await?;
        let location = self
            .locations
            .get(ctx, row.get_i64(Dataset::LOCATION_ID)?, row, eager)
            .await?;
        let license = self
            .licenses
            .get(ctx, row.get_i64(Dataset::LICENSE_ID)?, row, eager)
            .await?;

        Ok(Some(Dataset {
            id: Some(id),
            experiment,
            location,
            license,
            name: row.get_string(Dataset::NAME)?.unwrap_or_default(),
            description: row.get_string(Dataset::DESCRIPTION)?,
            date_start: row.get_date(Dataset::DATE_START)?,
            date_end: row.get_date(Dataset::DATE_END)?,
            source_file: row.get_string(Dataset::SOURCE_FILE)?,
            datatype: row.get_string(Dataset::DATATYPE)?,
            contact: row.get_string(Dataset::CONTACT)?,
            version: row.get_string(Dataset::VERSION)?,
            created_by: row.get_i64(Dataset::CREATED_BY)?,
            state,
            is_external: row.get_bool(Dataset::IS_EXTERNAL)?,
            hyperlink: row.get_string(Dataset::HYPERLINK)?,
            created_on: row.get_timestamp(Dataset::CREATED_ON)?,
            updated_on: row.get_timestamp(Dataset::UPDATED_ON)?,
            size: optional_count(row, Dataset::NR_OF_DATA_OBJECTS),
            data_points: optional_count(row, Dataset::NR_OF_DATA_POINTS),
            attribute_data: None,
            extra: Extras::default(),
        }))
    }
}

pub fn attach_attribute_data(dataset: &mut Dataset, data: Vec<AttributeData>) {
    dataset.attribute_data = Some(data);
}

/// Visibility guard for dataset managers.
#[must_use]
pub fn dataset_visible(ctx: &SecurityContext, dataset: &Dataset) -> bool {
    dataset.is_visible_to(ctx)
}
