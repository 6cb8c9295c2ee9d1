#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Genebank catalogue: accessions, datasets, their passport and attribute
//! data, hydrated from SQL rows through shared, permission-aware caches.
//!
//! [`Catalog`] is the composition root. It is built once per process by
//! [`CatalogModule::init`] and handed out as an `Arc`.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

#[cfg(test)]
mod config_tests;

pub use catalog::{Caches, Catalog, Parsers};
pub use config::CatalogConfig;
pub use module::CatalogModule;
