//! SQL-backed managers and child loaders.

pub mod loaders;
pub mod sql_manager;

pub use loaders::{ParamsFn, SqlChildLoader};
pub use sql_manager::{SqlManager, Visibility};

/// `SQLite` schema for the catalogue tables, used to bootstrap empty
/// databases.
pub const SCHEMA: &str = include_str!("schema.sql");
