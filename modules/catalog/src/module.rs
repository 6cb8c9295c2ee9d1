//! Catalogue module: owns the process-wide [`Catalog`].

use std::sync::Arc;

use seedbank_db::SqliteDatabase;
use seedbank_security::PolicyRef;
use tokio::sync::OnceCell;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::CatalogConfig;
use crate::infra::storage::SCHEMA;

/// Holds the catalogue once it has been initialized.
#[derive(Default)]
pub struct CatalogModule {
    catalog: OnceCell<Arc<Catalog<SqliteDatabase>>>,
}

impl CatalogModule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect, optionally bootstrap the schema, and build every cache.
    /// Concurrent calls build the catalogue once; every call but the one
    /// that built it fails.
    ///
    /// # Errors
    /// Fails when the module was already initialized, the database cannot be
    /// reached, or the schema bootstrap fails.
    pub async fn init(
        &self,
        config: &CatalogConfig,
        policy: PolicyRef,
    ) -> anyhow::Result<Arc<Catalog<SqliteDatabase>>> {
        info!("Initializing catalog");
        let mut created = false;
        let built = &mut created;
        let catalog = self
            .catalog
            .get_or_try_init(|| async move {
                *built = true;
                let db = SqliteDatabase::connect(&config.database).await?;
                if config.bootstrap_schema {
                    db.execute_script(SCHEMA).await?;
                    info!("Catalog schema bootstrapped");
                }
                Ok::<_, anyhow::Error>(Arc::new(Catalog::new(
                    Arc::new(db),
                    policy,
                    &config.hydrate,
                )))
            })
            .await?;
        if !created {
            anyhow::bail!("Catalog already initialized");
        }

        info!(
            cache_enabled = config.hydrate.cache.enabled,
            overrides = config.hydrate.overrides.len(),
            "Catalog initialized"
        );
        Ok(Arc::clone(catalog))
    }

    /// # Errors
    /// Fails before [`CatalogModule::init`] has completed.
    pub fn catalog(&self) -> anyhow::Result<Arc<Catalog<SqliteDatabase>>> {
        self.catalog
            .get()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Catalog not initialized"))
    }
}
