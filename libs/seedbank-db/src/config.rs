use std::time::Duration;

use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::{DbError, Result};

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// `SQLite` DSN, e.g. `sqlite://data/seedbank.db` or `sqlite::memory:`.
    pub dsn: String,

    /// Maximum number of pooled connections. In-memory databases always use one.
    pub max_conns: Option<u32>,

    /// Minimum number of pooled connections.
    pub min_conns: Option<u32>,

    /// Timeout to acquire a connection from the pool.
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Option<Duration>,

    /// Idle timeout before a connection is closed. Ignored for in-memory databases.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite::memory:".to_owned(),
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
        }
    }
}

impl DbConfig {
    /// Extract the section at `key`; a missing section yields the defaults.
    ///
    /// # Errors
    /// Returns `DbError::InvalidConfig` when the section does not deserialize.
    pub fn from_figment(figment: &Figment, key: &str) -> Result<Self> {
        if !figment.contains(key) {
            return Ok(Self::default());
        }
        figment
            .extract_inner(key)
            .map_err(|e| DbError::InvalidConfig(e.to_string()))
    }
}
