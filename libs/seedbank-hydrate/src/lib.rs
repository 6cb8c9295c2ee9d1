#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Row hydration and permission-aware object caching.
//!
//! A root [`Parser`] turns one flat [`Row`] into a typed entity. Every
//! foreign key goes through the referenced type's [`ObjectCache`], which
//! either parses the referenced entity out of the same row (eager, when the
//! table was joined) or fetches it through its [`Manager`] (lazy), checking
//! access and memoizing per `(id, access scope)`. An access denial anywhere
//! in the graph drops the whole row; malformed data drops only the entity
//! that carries it.
//!
//! [`Writer`] and [`BatchedWriter`] go the other way: they bind an entity
//! into an `INSERT` and write the generated key back onto it.

pub mod cache;
pub mod config;
pub mod database;
pub mod enrich;
pub mod entity;
pub mod error;
pub mod manager;
pub mod parser;
pub mod projection;
pub mod query;
pub mod row;
pub mod sql;
pub mod writer;

#[cfg(test)]
mod test_support;

pub use cache::ObjectCache;
pub use config::{CacheSettings, HydrateConfig};
pub use database::{Database, Insertable, Mapped};
pub use enrich::{Attach, ChildLoader, FullParser};
pub use entity::{Entity, Extras, Id, Ref, entity_ids, ref_id};
pub use error::{DatabaseError, HydrateError, HydrateResult};
pub use manager::{Manager, ManagerRef};
pub use parser::{GuardedParser, Parser, ParserRef};
pub use projection::{
    Average, Count, Distance, ExtraColumns, Projected, ProjectingParser, Projection,
};
pub use query::{fetch_objects, fetch_projected};
pub use row::{MemoryRow, Row, SqlValue, decode_enum};
pub use writer::{BatchStatement, BatchedWriter, Writer};
