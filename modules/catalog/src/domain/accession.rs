use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use seedbank_hydrate::{
    Extras, HydrateResult, Id, Insertable, Mapped, ObjectCache, Parser, Ref, Row, SqlValue,
    impl_entity, ref_id,
};
use seedbank_security::SecurityContext;

use super::institution::Institution;
use super::location::Location;
use super::pedigree::Pedigree;

/// A germplasm sample held by an institution, with its passport data.
///
/// `pedigrees` is `None` after a minimal parse.
#[derive(Debug, Clone, Default)]
pub struct Accession {
    pub id: Option<Id>,
    pub general_identifier: String,
    pub number: Option<String>,
    pub name: Option<String>,
    pub bank_number: Option<String>,
    pub breeders_code: Option<String>,
    pub breeders_name: Option<String>,
    pub institution: Option<Ref<Institution>>,
    pub location: Option<Ref<Location>>,
    pub puid: Option<String>,
    pub donor_code: Option<String>,
    pub donor_name: Option<String>,
    pub acquisition_date: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub collection_number: Option<String>,
    pub collector_name: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub pedigrees: Option<Vec<Pedigree>>,
    pub extra: Extras,
}

impl_entity!(Accession, kind = "accession", id_column = Accession::ID);

impl Accession {
    pub const ID: &'static str = "accessions.id";
    pub const GENERAL_IDENTIFIER: &'static str = "accessions.general_identifier";
    pub const NUMBER: &'static str = "accessions.number";
    pub const NAME: &'static str = "accessions.name";
    pub const BANK_NUMBER: &'static str = "accessions.bank_number";
    pub const BREEDERS_CODE: &'static str = "accessions.breeders_code";
    pub const BREEDERS_NAME: &'static str = "accessions.breeders_name";
    pub const INSTITUTION_ID: &'static str = "accessions.institution_id";
    pub const LOCATION_ID: &'static str = "accessions.location_id";
    pub const PUID: &'static str = "accessions.puid";
    pub const DONOR_CODE: &'static str = "accessions.donor_code";
    pub const DONOR_NAME: &'static str = "accessions.donor_name";
    pub const ACQDATE: &'static str = "accessions.acqdate";
    pub const COLLDATE: &'static str = "accessions.colldate";
    pub const COLLNUMB: &'static str = "accessions.collnumb";
    pub const COLLNAME: &'static str = "accessions.collname";
    pub const CREATED_ON: &'static str = "accessions.created_on";
    pub const UPDATED_ON: &'static str = "accessions.updated_on";

    #[must_use]
    pub fn new(general_identifier: impl Into<String>) -> Self {
        Self {
            general_identifier: general_identifier.into(),
            ..Self::default()
        }
    }
}

impl Mapped for Accession {
    const TABLE: &'static str = "accessions";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::GENERAL_IDENTIFIER,
        Self::NUMBER,
        Self::NAME,
        Self::BANK_NUMBER,
        Self::BREEDERS_CODE,
        Self::BREEDERS_NAME,
        Self::INSTITUTION_ID,
        Self::LOCATION_ID,
        Self::PUID,
        Self::DONOR_CODE,
        Self::DONOR_NAME,
        Self::ACQDATE,
        Self::COLLDATE,
        Self::COLLNUMB,
        Self::COLLNAME,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for Accession {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::GENERAL_IDENTIFIER,
        Self::NUMBER,
        Self::NAME,
        Self::BANK_NUMBER,
        Self::BREEDERS_CODE,
        Self::BREEDERS_NAME,
        Self::INSTITUTION_ID,
        Self::LOCATION_ID,
        Self::PUID,
        Self::DONOR_CODE,
        Self::DONOR_NAME,
        Self::ACQDATE,
        Self::COLLDATE,
        Self::COLLNUMB,
        Self::COLLNAME,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            self.general_identifier.as_str().into(),
            self.number.clone().into(),
            self.name.clone().into(),
            self.bank_number.clone().into(),
            self.breeders_code.clone().into(),
            self.breeders_name.clone().into(),
            ref_id(self.institution.as_ref()).into(),
            ref_id(self.location.as_ref()).into(),
            self.puid.clone().into(),
            self.donor_code.clone().into(),
            self.donor_name.clone().into(),
            self.acquisition_date.clone().into(),
            self.collection_date.into(),
            self.collection_number.clone().into(),
            self.collector_name.clone().into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

pub struct AccessionParser {
    institutions: Arc<ObjectCache<Institution>>,
    locations: Arc<ObjectCache<Location>>,
}

impl AccessionParser {
    #[must_use]
    pub fn new(
        institutions: Arc<ObjectCache<Institution>>,
        locations: Arc<ObjectCache<Location>>,
    ) -> Self {
        Self {
            institutions,
            locations,
        }
    }
}

#[async_trait]
impl Parser<Accession> for AccessionParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<Accession>> {
        let Some(id) = row.get_i64(Accession::ID)? else {
            return Ok(None);
        };
        // Institutions are never joined into accession queries.
        let institution = self
            .institutions
            .get(ctx, row.get_i64(Accession::INSTITUTION_ID)?, row, false)
            .await?;
        let location = self
            .locations
            .get(ctx, row.get_i64(Accession::LOCATION_ID)?, row, eager)
            .await?;

        Ok(Some(Accession {
            id: Some(id),
            general_identifier: row
                .get_string(Accession::GENERAL_IDENTIFIER)?
                .unwrap_or_default(),
            number: row.get_string(Accession::NUMBER)?,
            name: row.get_string(Accession::NAME)?,
            bank_number: row.get_string(Accession::BANK_NUMBER)?,
            breeders_code: row.get_string(Accession::BREEDERS_CODE)?,
            breeders_name: row.get_string(Accession::BREEDERS_NAME)?,
            institution,
            location,
            puid: row.get_string(Accession::PUID)?,
            donor_code: row.get_string(Accession::DONOR_CODE)?,
            donor_name: row.get_string(Accession::DONOR_NAME)?,
            acquisition_date: row.get_string(Accession::ACQDATE)?,
            collection_date: row.get_date(Accession::COLLDATE)?,
            collection_number: row.get_string(Accession::COLLNUMB)?,
            collector_name: row.get_string(Accession::COLLNAME)?,
            created_on: row.get_timestamp(Accession::CREATED_ON)?,
            updated_on: row.get_timestamp(Accession::UPDATED_ON)?,
            pedigrees: None,
            extra: Extras::default(),
        }))
    }
}

pub fn attach_pedigrees(accession: &mut Accession, pedigrees: Vec<Pedigree>) {
    accession.pedigrees = Some(pedigrees);
}
