use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seedbank_hydrate::{
    Extras, HydrateResult, Id, Insertable, Mapped, ObjectCache, Parser, Ref, Row, SqlValue,
    impl_entity, ref_id,
};
use seedbank_security::SecurityContext;

use super::country::Country;

/// A holding institute (genebank, university, breeder).
#[derive(Debug, Clone, Default)]
pub struct Institution {
    pub id: Option<Id>,
    pub code: Option<String>,
    pub name: String,
    pub acronym: Option<String>,
    pub country: Option<Ref<Country>>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub extra: Extras,
}

impl_entity!(Institution, kind = "institution", id_column = Institution::ID);

impl Institution {
    pub const ID: &'static str = "institutions.id";
    pub const CODE: &'static str = "institutions.code";
    pub const NAME: &'static str = "institutions.name";
    pub const ACRONYM: &'static str = "institutions.acronym";
    pub const COUNTRY_ID: &'static str = "institutions.country_id";
    pub const CONTACT: &'static str = "institutions.contact";
    pub const PHONE: &'static str = "institutions.phone";
    pub const EMAIL: &'static str = "institutions.email";
    pub const ADDRESS: &'static str = "institutions.address";
    pub const CREATED_ON: &'static str = "institutions.created_on";
    pub const UPDATED_ON: &'static str = "institutions.updated_on";
}

impl Mapped for Institution {
    const TABLE: &'static str = "institutions";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::CODE,
        Self::NAME,
        Self::ACRONYM,
        Self::COUNTRY_ID,
        Self::CONTACT,
        Self::PHONE,
        Self::EMAIL,
        Self::ADDRESS,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for Institution {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::CODE,
        Self::NAME,
        Self::ACRONYM,
        Self::COUNTRY_ID,
        Self::CONTACT,
        Self::PHONE,
        Self::EMAIL,
        Self::ADDRESS,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            self.code.clone().into(),
            self.name.as_str().into(),
            self.acronym.clone().into(),
            ref_id(self.country.as_ref()).into(),
            self.contact.clone().into(),
            self.phone.clone().into(),
            self.email.clone().into(),
            self.address.clone().into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

pub struct InstitutionParser {
    countries: Arc<ObjectCache<Country>>,
}

impl InstitutionParser {
    #[must_use]
    pub fn new(countries: Arc<ObjectCache<Country>>) -> Self {
        Self { countries }
    }
}

#[async_trait]
impl Parser<Institution> for InstitutionParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<Institution>> {
        let Some(id) = row.get_i64(Institution::ID)? else {
            return Ok(None);
        };
        let country = self
            .countries
            .get(ctx, row.get_i64(Institution::COUNTRY_ID)?, row, eager)
            .await?;
        Ok(Some(Institution {
            id: Some(id),
            code: row.get_string(Institution::CODE)?,
            name: row.get_string(Institution::NAME)?.unwrap_or_default(),
            acronym: row.get_string(Institution::ACRONYM)?,
            country,
            contact: row.get_string(Institution::CONTACT)?,
            phone: row.get_string(Institution::PHONE)?,
            email: row.get_string(Institution::EMAIL)?,
            address: row.get_string(Institution::ADDRESS)?,
            created_on: row.get_timestamp(Institution::CREATED_ON)?,
            updated_on: row.get_timestamp(Institution::UPDATED_ON)?,
            extra: Extras::default(),
        }))
    }
}
