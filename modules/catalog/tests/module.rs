#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use seedbank_catalog::domain::Country;
use seedbank_catalog::{CatalogConfig, CatalogModule};
use seedbank_hydrate::{Count, HydrateError};
use seedbank_security::{AllowAll, SecurityContext};

#[tokio::test]
async fn init_bootstraps_the_schema_once() {
    let module = CatalogModule::new();
    assert!(module.catalog().is_err());

    let config = CatalogConfig {
        bootstrap_schema: true,
        ..CatalogConfig::default()
    };
    let catalog = module.init(&config, Arc::new(AllowAll)).await.unwrap();

    let mut peru = Country {
        name: "Peru".to_owned(),
        ..Country::default()
    };
    catalog.insert(&mut peru).await.unwrap();
    let counts = catalog
        .countries_with_institution_counts(&SecurityContext::anonymous())
        .await
        .unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].projection, Count(0));
    assert!(Arc::ptr_eq(&catalog, &module.catalog().unwrap()));

    let err = module
        .init(&config, Arc::new(AllowAll))
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("already initialized"));
}

#[tokio::test]
async fn storage_failures_surface_as_errors() {
    let module = CatalogModule::new();
    let catalog = module
        .init(&CatalogConfig::default(), Arc::new(AllowAll))
        .await
        .unwrap();

    let err = catalog
        .countries_with_institution_counts(&SecurityContext::anonymous())
        .await
        .unwrap_err();

    assert!(matches!(err, HydrateError::Storage(_)));
}
