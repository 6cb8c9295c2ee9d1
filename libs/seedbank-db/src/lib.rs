#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `SQLite` implementation of the hydration storage collaborators.
//!
//! [`SqliteDatabase`] runs parameterized statements through an sqlx pool and
//! hands rows back as [`SqliteResultRow`], which reads columns by their
//! (aliased, table-qualified) names.

pub mod config;
mod row;
mod sqlite;

pub use config::DbConfig;
pub use row::SqliteResultRow;
pub use sqlite::{SqliteDatabase, is_memory_dsn};

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for connecting and bootstrapping.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
