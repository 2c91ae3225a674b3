mod diff;
mod error;
mod executor;
mod memory;
mod orchestrator;
mod outcome;

pub use diff::{ChangeKind, DatabaseTable, DiffAction, DiffEntry, SchemaDiff};
pub use error::MigrationError;
pub use executor::{BoxFuture, SchemaExecutor, SqlxExecutor};
pub use memory::MemoryExecutor;
pub use orchestrator::MigrationOrchestrator;
pub use outcome::{FinalStatus, OutcomeAccumulator, Phase, PhaseResult, ProcessOutcome};
