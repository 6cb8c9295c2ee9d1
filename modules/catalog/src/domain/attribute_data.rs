use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seedbank_hydrate::{
    Entity, Extras, HydrateError, HydrateResult, Id, Insertable, Mapped, ObjectCache, Parser, Ref,
    Row, SqlValue, impl_entity,
};
use seedbank_security::SecurityContext;

use super::accession::Accession;
use super::attribute::Attribute;
use super::dataset::Dataset;

/// The entity an attribute value belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeTarget {
    Accession(Ref<Accession>),
    Dataset(Ref<Dataset>),
}

impl AttributeTarget {
    #[must_use]
    pub fn id(&self) -> Option<Id> {
        match self {
            Self::Accession(r) => r.id(),
            Self::Dataset(r) => r.id(),
        }
    }
}

/// One attribute value for one accession or dataset.
#[derive(Debug, Clone)]
pub struct AttributeData {
    pub id: Option<Id>,
    pub attribute: Ref<Attribute>,
    pub target: AttributeTarget,
    pub value: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub extra: Extras,
}

impl_entity!(AttributeData, kind = "attributedata", id_column = AttributeData::ID);

impl AttributeData {
    pub const ID: &'static str = "attributedata.id";
    pub const ATTRIBUTE_ID: &'static str = "attributedata.attribute_id";
    pub const FOREIGN_ID: &'static str = "attributedata.foreign_id";
    pub const VALUE: &'static str = "attributedata.value";
    pub const CREATED_ON: &'static str = "attributedata.created_on";
    pub const UPDATED_ON: &'static str = "attributedata.updated_on";

    #[must_use]
    pub fn new(attribute: Ref<Attribute>, target: AttributeTarget, value: impl Into<String>) -> Self {
        Self {
            id: None,
            attribute,
            target,
            value: Some(value.into()),
            created_on: None,
            updated_on: None,
            extra: Extras::default(),
        }
    }
}

impl Mapped for AttributeData {
    const TABLE: &'static str = "attributedata";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::ATTRIBUTE_ID,
        Self::FOREIGN_ID,
        Self::VALUE,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for AttributeData {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::ATTRIBUTE_ID,
        Self::FOREIGN_ID,
        Self::VALUE,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        let attribute_id = self.attribute.id().ok_or_else(|| HydrateError::Precondition {
            kind: Self::KIND,
            reason: "attribute has not been saved".to_owned(),
        })?;
        let foreign_id = self.target.id().ok_or_else(|| HydrateError::Precondition {
            kind: Self::KIND,
            reason: "target has not been saved".to_owned(),
        })?;
        Ok(vec![
            attribute_id.into(),
            foreign_id.into(),
            self.value.clone().into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

/// How the `foreign_id` column is resolved.
enum TargetResolver {
    Accessions(Arc<ObjectCache<Accession>>),
    Datasets(Arc<ObjectCache<Dataset>>),
    /// Back-reference to the dataset whose full parse is attaching these rows.
    DatasetStub,
}

pub struct AttributeDataParser {
    attributes: Arc<ObjectCache<Attribute>>,
    target: TargetResolver,
}

impl AttributeDataParser {
    #[must_use]
    pub fn for_accessions(
        attributes: Arc<ObjectCache<Attribute>>,
        accessions: Arc<ObjectCache<Accession>>,
    ) -> Self {
        Self {
            attributes,
            target: TargetResolver::Accessions(accessions),
        }
    }

    #[must_use]
    pub fn for_datasets(
        attributes: Arc<ObjectCache<Attribute>>,
        datasets: Arc<ObjectCache<Dataset>>,
    ) -> Self {
        Self {
            attributes,
            target: TargetResolver::Datasets(datasets),
        }
    }

    /// Used by the full dataset parser: the dataset is referenced by id only
    /// and never parsed again.
    #[must_use]
    pub fn dataset_stub(attributes: Arc<ObjectCache<Attribute>>) -> Self {
        Self {
            attributes,
            target: TargetResolver::DatasetStub,
        }
    }
}

#[async_trait]
impl Parser<AttributeData> for AttributeDataParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        ctx: &SecurityContext,
        eager: bool,
    ) -> HydrateResult<Option<AttributeData>> {
        let Some(id) = row.get_i64(AttributeData::ID)? else {
            return Ok(None);
        };
        let attribute = self
            .attributes
            .get_required(
                ctx,
                row.get_i64(AttributeData::ATTRIBUTE_ID)?,
                row,
                eager,
                AttributeData::KIND,
                AttributeData::ATTRIBUTE_ID,
            )
            .await?;

        let foreign_id = row.get_i64(AttributeData::FOREIGN_ID)?;
        let target = match &self.target {
            TargetResolver::Accessions(cache) => AttributeTarget::Accession(
                cache
                    .get_required(
                        ctx,
                        foreign_id,
                        row,
                        eager,
                        AttributeData::KIND,
                        AttributeData::FOREIGN_ID,
                    )
                    .await?,
            ),
            TargetResolver::Datasets(cache) => AttributeTarget::Dataset(
                cache
                    .get_required(
                        ctx,
                        foreign_id,
                        row,
                        eager,
                        AttributeData::KIND,
                        AttributeData::FOREIGN_ID,
                    )
                    .await?,
            ),
            TargetResolver::DatasetStub => {
                let id = foreign_id.ok_or(HydrateError::MissingReference {
                    kind: AttributeData::KIND,
                    column: AttributeData::FOREIGN_ID,
                })?;
                AttributeTarget::Dataset(Ref::Stub(id))
            }
        };

        Ok(Some(AttributeData {
            id: Some(id),
            attribute,
            target,
            value: row.get_string(AttributeData::VALUE)?,
            created_on: row.get_timestamp(AttributeData::CREATED_ON)?,
            updated_on: row.get_timestamp(AttributeData::UPDATED_ON)?,
            extra: Extras::default(),
        }))
    }
}
