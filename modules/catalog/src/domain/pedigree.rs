use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seedbank_hydrate::{
    Entity, Extras, HydrateError, HydrateResult, Id, Insertable, Mapped, ObjectCache, Parser, Ref,
    Row, SqlValue, decode_enum, impl_entity,
};
use seedbank_security::SecurityContext;

use super::accession::Accession;

/// Role of the parent in a pedigree relationship. Closed set, stored by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRole {
    Male,
    Female,
    Other,
}

impl ParentRole {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "OTHER",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// `parent` is a parent of `accession`. An accession may be its own parent.
#[derive(Debug, Clone)]
pub struct Pedigree {
    pub id: Option<Id>,
    pub accession: Ref<Accession>,
    pub parent: Ref<Accession>,
    pub role: Option<ParentRole>,
    pub description: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub extra: Extras,
}

impl_entity!(Pedigree, kind = "pedigree", id_column = Pedigree::ID);

impl Pedigree {
    pub const ID: &'static str = "pedigrees.id";
    pub const ACCESSION_ID: &'static str = "pedigrees.accession_id";
    pub const PARENT_ID: &'static str = "pedigrees.parent_id";
    pub const RELATIONSHIP_TYPE: &'static str = "pedigrees.relationship_type";
    pub const RELATIONSHIP_DESCRIPTION: &'static str = "pedigrees.relationship_description";
    pub const CREATED_ON: &'static str = "pedigrees.created_on";
    pub const UPDATED_ON: &'static str = "pedigrees.updated_on";

    #[must_use]
    pub fn new(accession: Ref<Accession>, parent: Ref<Accession>, role: ParentRole) -> Self {
        Self {
            id: None,
            accession,
            parent,
            role: Some(role),
            description: None,
            created_on: None,
            updated_on: None,
            extra: Extras::default(),
        }
    }
}

impl Mapped for Pedigree {
    const TABLE: &'static str = "pedigrees";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::ACCESSION_ID,
        Self::PARENT_ID,
        Self::RELATIONSHIP_TYPE,
        Self::RELATIONSHIP_DESCRIPTION,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for Pedigree {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::ACCESSION_ID,
        Self::PARENT_ID,
        Self::RELATIONSHIP_TYPE,
        Self::RELATIONSHIP_DESCRIPTION,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        let unsaved = |what: &str| HydrateError::Precondition {
            kind: Self::KIND,
            reason: format!("{what} accession has not been saved"),
        };
        let accession_id = self.accession.id().ok_or_else(|| unsaved("child"))?;
        let parent_id = self.parent.id().ok_or_else(|| unsaved("parent"))?;
        Ok(vec![
            accession_id.into(),
            parent_id.into(),
            self.role.map(ParentRole::code).into(),
            self.description.clone().into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

/// Resolves both ends through the shared accession cache. The parent is
/// always fetched lazily since a pedigree row can only join one accession.
pub struct PedigreeParser {
    accessions: Arc<ObjectCache<Accession>>,
    accession_stub: bool,
}

impl PedigreeParser {
    #[must_use]
    pub fn new(accessions: Arc<ObjectCache<Accession>>) -> Self {
        Self {
            accessions,
            accession_stub: false,
        }
    }

    /// For the full accession parser: the child accession is the one being
    /// attached to and stays a stub.
    #[must_use]
    pub fn non_recursive(accessions: Arc<ObjectCache<Accession>>) -> Self {
        Self {
            accessions,
            accession_stub: true,
        }
    }
}

#[async_trait]
impl Parser<Pedigree> for PedigreeParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<Pedigree>> {
        let Some(id) = row.get_i64(Pedigree::ID)? else {
            return Ok(None);
        };
        let role = decode_enum(
            Pedigree::KIND,
            Pedigree::RELATIONSHIP_TYPE,
            row.get_string(Pedigree::RELATIONSHIP_TYPE)?,
            |raw| ParentRole::from_code(raw),
        )?;

        let accession_id = row.get_i64(Pedigree::ACCESSION_ID)?;
        let accession = if self.accession_stub {
            Ref::Stub(accession_id.ok_or(HydrateError::MissingReference {
                kind: Pedigree::KIND,
                column: Pedigree::ACCESSION_ID,
            })?)
        } else {
            self.accessions
                .get_required(
                    ctx,
                    accession_id,
                    row,
                    eager,
                    Pedigree::KIND,
                    Pedigree::ACCESSION_ID,
                )
                .await?
        };
        let parent = self
            .accessions
            .get_required(
                ctx,
                row.get_i64(Pedigree::PARENT_ID)?,
                row,
                false,
                Pedigree::KIND,
                Pedigree::PARENT_ID,
            )
            .await?;

        Ok(Some(Pedigree {
            id: Some(id),
            accession,
            parent,
            role,
            description: row.get_string(Pedigree::RELATIONSHIP_DESCRIPTION)?,
            created_on: row.get_timestamp(Pedigree::CREATED_ON)?,
            updated_on: row.get_timestamp(Pedigree::UPDATED_ON)?,
            extra: Extras::default(),
        }))
    }
}
