//! Cache configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for one [`crate::ObjectCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// When disabled every reference goes to the manager.
    pub enabled: bool,

    /// Maximum number of memoized `(id, scope)` entries.
    pub max_entries: u64,

    /// Time-to-live for memoized entries; unset keeps them until cleared.
    #[serde(with = "humantime_serde")]
    pub ttl: Option<Duration>,

    /// Re-run the manager's access check on every cache hit.
    pub revalidate_hits: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            ttl: None,
            revalidate_hits: true,
        }
    }
}

fn default_max_entries() -> u64 {
    10_000
}

/// Cache settings for every entity kind of a composition root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HydrateConfig {
    /// Applied to kinds without an override.
    pub cache: CacheSettings,

    /// Per-kind settings keyed by entity kind, e.g. `accession`.
    pub overrides: BTreeMap<String, CacheSettings>,
}

impl HydrateConfig {
    #[must_use]
    pub fn settings_for(&self, kind: &str) -> &CacheSettings {
        self.overrides.get(kind).unwrap_or(&self.cache)
    }
}
