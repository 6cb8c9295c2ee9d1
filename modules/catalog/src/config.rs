//! Catalogue configuration.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use seedbank_db::DbConfig;
use seedbank_hydrate::HydrateConfig;
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides, e.g. `SEEDBANK__DATABASE__DSN`.
pub const ENV_PREFIX: &str = "SEEDBANK__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub database: DbConfig,

    /// Object cache settings, per entity kind.
    pub hydrate: HydrateConfig,

    /// Create the catalogue tables on init when they do not exist.
    pub bootstrap_schema: bool,
}

impl CatalogConfig {
    /// YAML file (when given) overlaid with `SEEDBANK__` environment
    /// variables. Nested keys are separated by `__`.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// # Errors
    /// Returns an error when a provider fails or the merged configuration
    /// does not deserialize.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Ok(Self::figment(path).extract()?)
    }
}
