use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use seedbank_hydrate::{
    Extras, HydrateResult, Id, Insertable, Mapped, Parser, Row, SqlValue, impl_entity,
};
use seedbank_security::SecurityContext;

/// The trial or genotyping run a dataset belongs to.
#[derive(Debug, Clone, Default)]
pub struct Experiment {
    pub id: Option<Id>,
    pub name: String,
    pub user_id: Option<i64>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    /// Lookup id into the experiment type table; not resolved here.
    pub experiment_type_id: Option<i64>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub extra: Extras,
}

impl_entity!(Experiment, kind = "experiment", id_column = Experiment::ID);

impl Experiment {
    pub const ID: &'static str = "experiments.id";
    pub const NAME: &'static str = "experiments.experiment_name";
    pub const USER_ID: &'static str = "experiments.user_id";
    pub const DESCRIPTION: &'static str = "experiments.description";
    pub const DATE: &'static str = "experiments.experiment_date";
    pub const EXPERIMENT_TYPE_ID: &'static str = "experiments.experiment_type_id";
    pub const CREATED_ON: &'static str = "experiments.created_on";
    pub const UPDATED_ON: &'static str = "experiments.updated_on";

    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl Mapped for Experiment {
    const TABLE: &'static str = "experiments";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::NAME,
        Self::USER_ID,
        Self::DESCRIPTION,
        Self::DATE,
        Self::EXPERIMENT_TYPE_ID,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for Experiment {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::NAME,
        Self::USER_ID,
        Self::DESCRIPTION,
        Self::DATE,
        Self::EXPERIMENT_TYPE_ID,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            self.name.as_str().into(),
            self.user_id.into(),
            self.description.clone().into(),
            self.date.into(),
            self.experiment_type_id.into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

pub struct ExperimentParser;

#[async_trait]
impl Parser<Experiment> for ExperimentParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        _ctx: &SecurityContext,
        _eager: bool,
    ) -> HydrateResult<Option<Experiment>> {
        let Some(id) = row.get_i64(Experiment::ID)? else {
            return Ok(None);
        };
        Ok(Some(Experiment {
            id: Some(id),
            name: row.get_string(Experiment::NAME)?.unwrap_or_default(),
            user_id: row.get_i64(Experiment::USER_ID)?,
            description: row.get_string(Experiment::DESCRIPTION)?,
            date: row.get_date(Experiment::DATE)?,
            experiment_type_id: row.get_i64(Experiment::EXPERIMENT_TYPE_ID)?,
            created_on: row.get_timestamp(Experiment::CREATED_ON)?,
            updated_on: row.get_timestamp(Experiment::UPDATED_ON)?,
            extra: Extras::default(),
        }))
    }
}
