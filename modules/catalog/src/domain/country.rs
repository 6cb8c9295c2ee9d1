use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seedbank_hydrate::{
    Extras, HydrateResult, Id, Insertable, Mapped, Parser, Row, SqlValue, impl_entity,
};
use seedbank_security::SecurityContext;

#[derive(Debug, Clone, Default)]
pub struct Country {
    pub id: Option<Id>,
    pub code2: Option<String>,
    pub code3: Option<String>,
    pub name: String,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub extra: Extras,
}

impl_entity!(Country, kind = "country", id_column = Country::ID);

impl Country {
    pub const ID: &'static str = "countries.id";
    pub const CODE2: &'static str = "countries.country_code2";
    pub const CODE3: &'static str = "countries.country_code3";
    pub const NAME: &'static str = "countries.country_name";
    pub const CREATED_ON: &'static str = "countries.created_on";
    pub const UPDATED_ON: &'static str = "countries.updated_on";
}

impl Mapped for Country {
    const TABLE: &'static str = "countries";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::CODE2,
        Self::CODE3,
        Self::NAME,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for Country {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::CODE2,
        Self::CODE3,
        Self::NAME,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            self.code2.clone().into(),
            self.code3.clone().into(),
            self.name.as_str().into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

pub struct CountryParser;

#[async_trait]
impl Parser<Country> for CountryParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        _ctx: &SecurityContext,
        _eager: bool,
    ) -> HydrateResult<Option<Country>> {
        let Some(id) = row.get_i64(Country::ID)? else {
            return Ok(None);
        };
        Ok(Some(Country {
            id: Some(id),
            code2: row.get_string(Country::CODE2)?,
            code3: row.get_string(Country::CODE3)?,
            name: row.get_string(Country::NAME)?.unwrap_or_default(),
            created_on: row.get_timestamp(Country::CREATED_ON)?,
            updated_on: row.get_timestamp(Country::UPDATED_ON)?,
            extra: Extras::default(),
        }))
    }
}

