use std::str::FromStr;

use async_trait::async_trait;
use seedbank_hydrate::{Database, DatabaseError, Id, SqlValue};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, warn};

use crate::row::SqliteResultRow;
use crate::{DbConfig, Result};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// `true` for DSNs whose data lives in the connection itself.
#[must_use]
pub fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

fn storage(message: &str, err: sqlx::Error) -> DatabaseError {
    DatabaseError::with_source(message, err)
}

fn bind_params(mut query: SqliteQuery<'_>, params: Vec<SqlValue>) -> SqliteQuery<'_> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Int(v) => query.bind(v),
            SqlValue::Float(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Timestamp(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }
    query
}

/// Pooled `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect and build the pool.
    ///
    /// In-memory databases are pinned to a single connection that never
    /// expires, since every connection would otherwise see its own empty
    /// database.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid or the connection fails.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.dsn)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool = SqlitePoolOptions::new();
        if is_memory_dsn(&config.dsn) {
            if config.max_conns.is_some_and(|n| n > 1) {
                warn!(
                    max_conns = ?config.max_conns,
                    "in-memory SQLite uses a single connection"
                );
            }
            pool = pool
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            if let Some(n) = config.max_conns {
                pool = pool.max_connections(n);
            }
            if let Some(n) = config.min_conns {
                pool = pool.min_connections(n);
            }
            if let Some(t) = config.idle_timeout {
                pool = pool.idle_timeout(t);
            }
        }
        if let Some(t) = config.acquire_timeout {
            pool = pool.acquire_timeout(t);
        }

        let pool = pool.connect_with(options).await?;
        info!(dsn = %config.dsn, "SQLite pool ready");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run a multi-statement script, e.g. a schema bootstrap.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub async fn execute_script(&self, script: &str) -> Result<()> {
        sqlx::raw_sql(script).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    type Row = SqliteResultRow;

    async fn fetch_all(
        &self,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> std::result::Result<Vec<SqliteResultRow>, DatabaseError> {
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("query failed", e))?;
        debug!(rows = rows.len(), "query executed");
        Ok(rows.into_iter().map(SqliteResultRow::from).collect())
    }

    async fn insert(
        &self,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> std::result::Result<Id, DatabaseError> {
        let result = bind_params(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(|e| storage("insert failed", e))?;
        Ok(result.last_insert_rowid())
    }

    async fn insert_batch(
        &self,
        sql: &str,
        rows: Vec<Vec<SqlValue>>,
    ) -> std::result::Result<Vec<Id>, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage("cannot begin batch", e))?;
        let mut ids = Vec::with_capacity(rows.len());
        for params in rows {
            let result = bind_params(sqlx::query(sql), params)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage("batch insert failed", e))?;
            ids.push(result.last_insert_rowid());
        }
        tx.commit()
            .await
            .map_err(|e| storage("cannot commit batch", e))?;
        Ok(ids)
    }
}
