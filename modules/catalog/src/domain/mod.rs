//! Genebank entities and their row mappings.
//!
//! Every entity exposes its table-qualified column names as associated
//! constants, a minimal parser, and an [`seedbank_hydrate::Insertable`]
//! binding.

pub mod accession;
pub mod attribute;
pub mod attribute_data;
pub mod country;
pub mod dataset;
pub mod experiment;
pub mod institution;
pub mod license;
pub mod location;
pub mod pedigree;

pub use accession::{Accession, AccessionParser};
pub use attribute::{Attribute, AttributeParser, AttributeType};
pub use attribute_data::{AttributeData, AttributeDataParser, AttributeTarget};
pub use country::{Country, CountryParser};
pub use dataset::{Dataset, DatasetParser, DatasetState};
pub use experiment::{Experiment, ExperimentParser};
pub use institution::{Institution, InstitutionParser};
pub use license::{License, LicenseLog, LicenseLogParser, LicenseParser};
pub use location::{Location, LocationParser, LocationType};
pub use pedigree::{ParentRole, Pedigree, PedigreeParser};
