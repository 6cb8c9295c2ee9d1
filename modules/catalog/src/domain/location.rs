use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seedbank_hydrate::{
    Entity, Extras, HydrateResult, Id, Insertable, Mapped, ObjectCache, Parser, Ref, Row, SqlValue,
    decode_enum, impl_entity, ref_id,
};
use seedbank_security::SecurityContext;

use super::country::Country;

/// What a location is used for. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationType {
    CollectingSite,
    Datasets,
    Trials,
}

impl LocationType {
    #[must_use]
    pub fn id(self) -> i64 {
        match self {
            Self::CollectingSite => 1,
            Self::Datasets => 2,
            Self::Trials => 3,
        }
    }

    #[must_use]
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::CollectingSite),
            2 => Some(Self::Datasets),
            3 => Some(Self::Trials),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Location {
    pub id: Option<Id>,
    pub country: Option<Ref<Country>>,
    pub location_type: Option<LocationType>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub site_name: Option<String>,
    pub site_name_short: Option<String>,
    pub elevation: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub extra: Extras,
}

impl_entity!(Location, kind = "location", id_column = Location::ID);

impl Location {
    pub const ID: &'static str = "locations.id";
    pub const COUNTRY_ID: &'static str = "locations.country_id";
    pub const LOCATION_TYPE_ID: &'static str = "locations.locationtype_id";
    pub const STATE: &'static str = "locations.state";
    pub const REGION: &'static str = "locations.region";
    pub const SITE_NAME: &'static str = "locations.site_name";
    pub const SITE_NAME_SHORT: &'static str = "locations.site_name_short";
    pub const ELEVATION: &'static str = "locations.elevation";
    pub const LATITUDE: &'static str = "locations.latitude";
    pub const LONGITUDE: &'static str = "locations.longitude";
    pub const CREATED_ON: &'static str = "locations.created_on";
    pub const UPDATED_ON: &'static str = "locations.updated_on";
}

impl Mapped for Location {
    const TABLE: &'static str = "locations";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::COUNTRY_ID,
        Self::LOCATION_TYPE_ID,
        Self::STATE,
        Self::REGION,
        Self::SITE_NAME,
        Self::SITE_NAME_SHORT,
        Self::ELEVATION,
        Self::LATITUDE,
        Self::LONGITUDE,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for Location {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::COUNTRY_ID,
        Self::LOCATION_TYPE_ID,
        Self::STATE,
        Self::REGION,
        Self::SITE_NAME,
        Self::SITE_NAME_SHORT,
        Self::ELEVATION,
        Self::LATITUDE,
        Self::LONGITUDE,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            ref_id(self.country.as_ref()).into(),
            self.location_type.map(LocationType::id).into(),
            self.state.clone().into(),
            self.region.clone().into(),
            self.site_name.clone().into(),
            self.site_name_short.clone().into(),
            self.elevation.into(),
            self.latitude.into(),
            self.longitude.into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

pub struct LocationParser {
    countries: Arc<ObjectCache<Country>>,
}

impl LocationParser {
    #[must_use]
    pub fn new(countries: Arc<ObjectCache<Country>>) -> Self {
        Self { countries }
    }
}

#[async_trait]
impl Parser<Location> for LocationParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<Location>> {
        let Some(id) = row.get_i64(Location::ID)? else {
            return Ok(None);
        };
        let location_type = decode_enum(
            Location::KIND,
            Location::LOCATION_TYPE_ID,
            row.get_i64(Location::LOCATION_TYPE_ID)?,
            |raw| LocationType::from_id(*raw),
        )?;
        let country = self
            .countries
            .get(ctx, row.get_i64(Location::COUNTRY_ID)?, row, eager)
            .await?;
        Ok(Some(Location {
            id: Some(id),
            country,
            location_type,
            state: row.get_string(Location::STATE)?,
            region: row.get_string(Location::REGION)?,
            site_name: row.get_string(Location::SITE_NAME)?,
            site_name_short: row.get_string(Location::SITE_NAME_SHORT)?,
            elevation: row.get_f64(Location::ELEVATION)?,
            latitude: row.get_f64(Location::LATITUDE)?,
            longitude: row.get_f64(Location::LONGITUDE)?,
            created_on: row.get_timestamp(Location::CREATED_ON)?,
            updated_on: row.get_timestamp(Location::UPDATED_ON)?,
            extra: Extras::default(),
        }))
    }
}
