use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seedbank_hydrate::{
    Entity, Extras, HydrateError, HydrateResult, Id, Insertable, Mapped, Parser, Row, SqlValue,
    impl_entity,
};
use seedbank_security::SecurityContext;

/// A data license that has to be accepted before a dataset is exported.
///
/// `logs` is empty after a minimal parse. The full parser attaches the
/// acceptances recorded for the calling user only.
#[derive(Debug, Clone, Default)]
pub struct License {
    pub id: Option<Id>,
    pub name: String,
    pub description: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub logs: Vec<LicenseLog>,
    pub extra: Extras,
}

impl_entity!(License, kind = "license", id_column = License::ID);

impl License {
    pub const ID: &'static str = "licenses.id";
    pub const NAME: &'static str = "licenses.name";
    pub const DESCRIPTION: &'static str = "licenses.description";
    pub const CREATED_ON: &'static str = "licenses.created_on";
    pub const UPDATED_ON: &'static str = "licenses.updated_on";

    #[must_use]
    pub fn accepted_by(&self, user_id: i64) -> bool {
        self.logs
            .iter()
            .any(|log| log.user_id == user_id && log.accepted_on.is_some())
    }
}

impl Mapped for License {
    const TABLE: &'static str = "licenses";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::NAME,
        Self::DESCRIPTION,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for License {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::NAME,
        Self::DESCRIPTION,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            self.name.as_str().into(),
            self.description.clone().into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

pub struct LicenseParser;

#[async_trait]
impl Parser<License> for LicenseParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        _ctx: &SecurityContext,
        _eager: bool,
    ) -> HydrateResult<Option<License>> {
        let Some(id) = row.get_i64(License::ID)? else {
            return Ok(None);
        };
        Ok(Some(License {
            id: Some(id),
            name: row.get_string(License::NAME)?.unwrap_or_default(),
            description: row.get_string(License::DESCRIPTION)?,
            created_on: row.get_timestamp(License::CREATED_ON)?,
            updated_on: row.get_timestamp(License::UPDATED_ON)?,
            logs: Vec::new(),
            extra: Extras::default(),
        }))
    }
}

/// One user's acceptance of a license.
#[derive(Debug, Clone, Default)]
pub struct LicenseLog {
    pub id: Option<Id>,
    pub license_id: Id,
    pub user_id: i64,
    pub accepted_on: Option<DateTime<Utc>>,
    pub extra: Extras,
}

impl_entity!(LicenseLog, kind = "licenselog", id_column = LicenseLog::ID);

impl LicenseLog {
    pub const ID: &'static str = "licenselogs.id";
    pub const LICENSE_ID: &'static str = "licenselogs.license_id";
    pub const USER_ID: &'static str = "licenselogs.user_id";
    pub const ACCEPTED_ON: &'static str = "licenselogs.accepted_on";
}

impl Mapped for LicenseLog {
    const TABLE: &'static str = "licenselogs";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::LICENSE_ID,
        Self::USER_ID,
        Self::ACCEPTED_ON,
    ];
}

impl Insertable for LicenseLog {
    const INSERT_COLUMNS: &'static [&'static str] =
        &[Self::LICENSE_ID, Self::USER_ID, Self::ACCEPTED_ON];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            self.license_id.into(),
            self.user_id.into(),
            self.accepted_on.into(),
        ])
    }
}

pub struct LicenseLogParser;

#[async_trait]
impl Parser<LicenseLog> for LicenseLogParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        _ctx: &SecurityContext,
        _eager: bool,
    ) -> HydrateResult<Option<LicenseLog>> {
        let Some(id) = row.get_i64(LicenseLog::ID)? else {
            return Ok(None);
        };
        let license_id = row
            .get_i64(LicenseLog::LICENSE_ID)?
            .ok_or(HydrateError::MissingReference {
                kind: LicenseLog::KIND,
                column: LicenseLog::LICENSE_ID,
            })?;
        let user_id = row
            .get_i64(LicenseLog::USER_ID)?
            .ok_or(HydrateError::MissingReference {
                kind: LicenseLog::KIND,
                column: LicenseLog::USER_ID,
            })?;
        Ok(Some(LicenseLog {
            id: Some(id),
            license_id,
            user_id,
            accepted_on: row.get_timestamp(LicenseLog::ACCEPTED_ON)?,
            extra: Extras::default(),
        }))
    }
}

/// Attaches loaded acceptances to a license.
pub fn attach_logs(license: &mut License, logs: Vec<LicenseLog>) {
    license.logs = logs;
}
