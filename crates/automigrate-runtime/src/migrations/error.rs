use thiserror::Error;

use automigrate_core::error::SyncError;

use super::outcome::Phase;

/// A failure of one table in one phase. Never aborts the run.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Failed to drop table {table}: {source}")]
    Drop { table: String, source: SyncError },

    #[error("Failed to migrate table {table} ({details}): {source}")]
    Migrate {
        table: String,
        details: String,
        source: SyncError,
    },

    #[error("Failed to create foreign key {constraint} on table {table}: {source}")]
    Constraint {
        table: String,
        constraint: String,
        source: SyncError,
    },
}

impl MigrationError {
    /// The table the failure belongs to.
    pub fn table(&self) -> &str {
        match self {
            MigrationError::Drop { table, .. }
            | MigrationError::Migrate { table, .. }
            | MigrationError::Constraint { table, .. } => table,
        }
    }

    /// The phase that produced the failure.
    pub fn phase(&self) -> Phase {
        match self {
            MigrationError::Drop { .. } => Phase::Drop,
            MigrationError::Migrate { .. } => Phase::Migrate,
            MigrationError::Constraint { .. } => Phase::Constraint,
        }
    }
}
