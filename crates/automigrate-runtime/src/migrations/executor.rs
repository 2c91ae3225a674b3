use std::future::Future;
use std::pin::Pin;

use sqlx::{AnyPool, Row};
use tracing::debug;

use automigrate_core::driver::{Dialect, DriverProfile};
use automigrate_core::error::{Result, SyncError};

use super::diff::{DatabaseTable, DiffEntry};
use crate::db::Database;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The DDL engine the orchestrator drives.
///
/// Implementations run one change at a time; the orchestrator never issues
/// a second call before the first one resolves.
pub trait SchemaExecutor: Send + Sync {
    /// Describe a live table, or `None` if it does not exist.
    fn introspect<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Option<DatabaseTable>>>;

    /// Apply one schema change.
    fn apply<'a>(&'a self, entry: &'a DiffEntry) -> BoxFuture<'a, Result<()>>;
}

/// Executes schema changes against a live database through sqlx.
pub struct SqlxExecutor {
    pool: AnyPool,
    profile: DriverProfile,
}

impl SqlxExecutor {
    /// Create a new executor.
    pub fn new(pool: AnyPool, profile: DriverProfile) -> Self {
        Self { pool, profile }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone(), db.profile())
    }

    async fn fetch_names(&self, sql: &str, table: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(sql)
            .bind(table.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SyncError::Database(format!("Failed to introspect {}: {}", table, e)))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(SyncError::from))
            .collect()
    }
}

impl SchemaExecutor for SqlxExecutor {
    fn introspect<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Option<DatabaseTable>>> {
        Box::pin(async move {
            let columns = self
                .fetch_names(&self.profile.list_columns_query(), table)
                .await?;
            if columns.is_empty() {
                return Ok(None);
            }

            let indexes = self
                .fetch_names(&self.profile.list_indexes_query(), table)
                .await?;

            Ok(Some(DatabaseTable {
                name: table.to_string(),
                columns,
                indexes,
            }))
        })
    }

    fn apply<'a>(&'a self, entry: &'a DiffEntry) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            debug!(table = %entry.table_name, "{}", entry.sql);

            sqlx::raw_sql(&entry.sql)
                .execute(&self.pool)
                .await
                .map_err(|e| SyncError::Database(e.to_string()))?;

            Ok(())
        })
    }
}
