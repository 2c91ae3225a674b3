pub mod db;
pub mod migrations;

pub use db::Database;
pub use migrations::{
    FinalStatus, MemoryExecutor, MigrationError, MigrationOrchestrator, ProcessOutcome,
    SchemaDiff, SchemaExecutor, SqlxExecutor,
};
