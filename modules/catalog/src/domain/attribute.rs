use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seedbank_hydrate::{
    Entity, Extras, HydrateError, HydrateResult, Id, Insertable, Mapped, Parser, Row, SqlValue,
    decode_enum, impl_entity,
};
use seedbank_security::SecurityContext;

/// Value type of an attribute. Closed set, stored by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Int,
    Float,
    Char,
    Date,
}

impl AttributeType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Char => "char",
            Self::Date => "date",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "char" => Some(Self::Char),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

/// A named, typed property that accessions and datasets can carry values for.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub id: Option<Id>,
    pub name: String,
    pub description: Option<String>,
    pub datatype: AttributeType,
    pub target_table: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub extra: Extras,
}

impl_entity!(Attribute, kind = "attribute", id_column = Attribute::ID);

impl Attribute {
    pub const ID: &'static str = "attributes.id";
    pub const NAME: &'static str = "attributes.name";
    pub const DESCRIPTION: &'static str = "attributes.description";
    pub const DATATYPE: &'static str = "attributes.datatype";
    pub const TARGET_TABLE: &'static str = "attributes.target_table";
    pub const CREATED_ON: &'static str = "attributes.created_on";
    pub const UPDATED_ON: &'static str = "attributes.updated_on";

    /// `target_table` of attributes whose values belong to accessions.
    pub const TARGET_ACCESSIONS: &'static str = "accessions";
    /// `target_table` of attributes whose values belong to datasets.
    pub const TARGET_DATASETS: &'static str = "datasets";

    #[must_use]
    pub fn new(name: impl Into<String>, datatype: AttributeType) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            datatype,
            target_table: None,
            created_on: None,
            updated_on: None,
            extra: Extras::default(),
        }
    }
}

impl Mapped for Attribute {
    const TABLE: &'static str = "attributes";
    const COLUMNS: &'static [&'static str] = &[
        Self::ID,
        Self::NAME,
        Self::DESCRIPTION,
        Self::DATATYPE,
        Self::TARGET_TABLE,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];
}

impl Insertable for Attribute {
    const INSERT_COLUMNS: &'static [&'static str] = &[
        Self::NAME,
        Self::DESCRIPTION,
        Self::DATATYPE,
        Self::TARGET_TABLE,
        Self::CREATED_ON,
        Self::UPDATED_ON,
    ];

    fn bind(&self) -> HydrateResult<Vec<SqlValue>> {
        Ok(vec![
            self.name.as_str().into(),
            self.description.clone().into(),
            self.datatype.as_str().into(),
            self.target_table.clone().into(),
            self.created_on.into(),
            self.updated_on.into(),
        ])
    }
}

pub struct AttributeParser;

#[async_trait]
impl Parser<Attribute> for AttributeParser {
    async fn map_row(
        &self,
        row: &dyn Row,
        _ctx: &SecurityContext,
        _eager: bool,
    ) -> HydrateResult<Option<Attribute>> {
        let Some(id) = row.get_i64(Attribute::ID)? else {
            return Ok(None);
        };
        let datatype = decode_enum(
            Attribute::KIND,
            Attribute::DATATYPE,
            row.get_string(Attribute::DATATYPE)?,
            |raw| AttributeType::parse(raw),
        )?
        .ok_or_else(|| HydrateError::malformed(Attribute::KIND, Attribute::DATATYPE, "NULL"))?;
        Ok(Some(Attribute {
            id: Some(id),
            name: row.get_string(Attribute::NAME)?.unwrap_or_default(),
            description: row.get_string(Attribute::DESCRIPTION)?,
            datatype,
            target_table: row.get_string(Attribute::TARGET_TABLE)?,
            created_on: row.get_timestamp(Attribute::CREATED_ON)?,
            updated_on: row.get_timestamp(Attribute::UPDATED_ON)?,
            extra: Extras::default(),
        }))
    }
}
