//! Drop, migrate and constraint phases over a model registry.
//!
//! Every phase always runs. Failures are recorded per table and never stop
//! the remaining tables or phases.

use tracing::{debug, info, warn};

use automigrate_core::driver::{Dialect, DriverProfile};
use automigrate_core::schema::{ModelRegistry, TableDef};

use super::diff::{DiffEntry, SchemaDiff};
use super::error::MigrationError;
use super::executor::SchemaExecutor;
use super::outcome::{OutcomeAccumulator, Phase, PhaseResult, ProcessOutcome};

/// Runs one full synchronization of a registry against a DDL engine.
pub struct MigrationOrchestrator<'a> {
    executor: &'a dyn SchemaExecutor,
    registry: &'a ModelRegistry,
    profile: DriverProfile,
}

impl<'a> MigrationOrchestrator<'a> {
    pub fn new(
        executor: &'a dyn SchemaExecutor,
        registry: &'a ModelRegistry,
        profile: DriverProfile,
    ) -> Self {
        Self {
            executor,
            registry,
            profile,
        }
    }

    pub fn profile(&self) -> DriverProfile {
        self.profile
    }

    /// Run drop, migrate and constraint phases in that order.
    pub async fn run(&self) -> ProcessOutcome {
        info!(
            driver = %self.profile.driver(),
            tables = self.registry.len(),
            "Starting auto migration"
        );

        let mut outcome = OutcomeAccumulator::new();
        outcome.record(self.drop_phase().await);
        outcome.record(self.migrate_phase().await);
        outcome.record(self.constraint_phase().await);

        info!(
            status = %outcome.final_status(),
            failures = outcome.failure_count(),
            "Auto migration finished"
        );
        outcome.finish()
    }

    /// Remove every registered table, dependents first.
    pub async fn drop_phase(&self) -> PhaseResult {
        let mut result = PhaseResult::new(Phase::Drop);

        for table in self.registry.drop_order() {
            match self.executor.introspect(&table.name).await {
                Ok(None) => {
                    debug!(table = %table.name, "Table not present, nothing to drop");
                    result.record_unchanged();
                    continue;
                }
                Ok(Some(_)) => {}
                Err(e) => {
                    warn!(table = %table.name, "Could not inspect table before drop: {}", e);
                }
            }

            let entry = DiffEntry::drop_table(&table.name, &self.profile);
            match self.executor.apply(&entry).await {
                Ok(()) => result.record_applied(),
                Err(source) => result.record_failure(MigrationError::Drop {
                    table: table.name.clone(),
                    source,
                }),
            }
        }

        if result.applied == 0 && result.succeeded() {
            info!("No tables to drop");
        }

        result
    }

    /// Create missing tables, columns and indexes, parents first.
    pub async fn migrate_phase(&self) -> PhaseResult {
        let mut result = PhaseResult::new(Phase::Migrate);

        for table in self.registry.create_order() {
            match self.migrate_table(table, &mut result).await {
                Ok(0) => result.record_unchanged(),
                Ok(count) => debug!(table = %table.name, changes = count, "Table migrated"),
                Err(failure) => result.record_failure(failure),
            }
        }

        result
    }

    async fn migrate_table(
        &self,
        table: &TableDef,
        result: &mut PhaseResult,
    ) -> std::result::Result<usize, MigrationError> {
        let live = self
            .executor
            .introspect(&table.name)
            .await
            .map_err(|source| MigrationError::Migrate {
                table: table.name.clone(),
                details: "introspection".to_string(),
                source,
            })?;

        let diff = SchemaDiff::from_comparison(table, live.as_ref(), &self.profile);
        let mut count = 0;

        for entry in &diff.entries {
            self.executor
                .apply(entry)
                .await
                .map_err(|source| MigrationError::Migrate {
                    table: table.name.clone(),
                    details: entry.details.clone(),
                    source,
                })?;
            result.record_applied();
            count += 1;
        }

        Ok(count)
    }

    /// One ADD CONSTRAINT attempt per declared foreign key.
    ///
    /// Skipped for drivers that declare foreign keys inline at creation.
    pub async fn constraint_phase(&self) -> PhaseResult {
        if !self.profile.requires_explicit_foreign_keys() {
            debug!(driver = %self.profile.driver(), "Foreign keys are created inline");
            return PhaseResult::skipped(Phase::Constraint);
        }

        let mut result = PhaseResult::new(Phase::Constraint);

        for table in self.registry.create_order() {
            for foreign_key in &table.foreign_keys {
                let entry = DiffEntry::add_foreign_key(&table.name, foreign_key, &self.profile);
                match self.executor.apply(&entry).await {
                    Ok(()) => result.record_applied(),
                    Err(source) => result.record_failure(MigrationError::Constraint {
                        table: table.name.clone(),
                        constraint: foreign_key.constraint_name_for(&table.name, &self.profile),
                        source,
                    }),
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::diff::{ChangeKind, DiffAction};
    use crate::migrations::memory::MemoryExecutor;
    use crate::migrations::outcome::FinalStatus;
    use automigrate_core::driver::Driver;
    use automigrate_core::schema::{FieldAttribute, FieldDef, ForeignKeyDef, RustType};

    fn id() -> FieldDef {
        FieldDef::new("id", RustType::I64).with_attribute(FieldAttribute::IdAuto)
    }

    /// auths <- users <- posts, with hobbies joined through user_hobbies.
    fn registry() -> ModelRegistry {
        ModelRegistry::builder()
            .register(
                TableDef::new("posts")
                    .with_field(id())
                    .with_field(FieldDef::new("title", RustType::String))
                    .with_field(FieldDef::new("id_auth", RustType::I64))
                    .with_foreign_key(ForeignKeyDef::new("id_auth", "users").references_column("id_auth")),
            )
            .register(
                TableDef::new("users")
                    .with_field(id())
                    .with_field(
                        FieldDef::new("id_auth", RustType::I64).with_attribute(FieldAttribute::Unique),
                    )
                    .with_field(FieldDef::new("first_name", RustType::String))
                    .with_foreign_key(ForeignKeyDef::new("id_auth", "auths")),
            )
            .register(
                TableDef::new("auths")
                    .with_field(id())
                    .with_field(
                        FieldDef::new("email", RustType::String).with_attribute(FieldAttribute::Unique),
                    ),
            )
            .register(
                TableDef::new("hobbies")
                    .with_field(id())
                    .with_field(FieldDef::new("hobby", RustType::String)),
            )
            .register(
                TableDef::new("user_hobbies")
                    .with_field(FieldDef::new("user_id", RustType::I64).with_attribute(FieldAttribute::Id))
                    .with_field(FieldDef::new("hobby_id", RustType::I64).with_attribute(FieldAttribute::Id))
                    .with_foreign_key(ForeignKeyDef::new("user_id", "users"))
                    .with_foreign_key(ForeignKeyDef::new("hobby_id", "hobbies")),
            )
            .build()
            .unwrap()
    }

    fn drops(entries: &[DiffEntry]) -> Vec<&str> {
        entries
            .iter()
            .filter(|e| e.kind() == ChangeKind::DropTable)
            .map(|e| e.table_name.as_str())
            .collect()
    }

    fn creates(entries: &[DiffEntry]) -> Vec<&DiffEntry> {
        entries
            .iter()
            .filter(|e| e.kind() == ChangeKind::CreateTable)
            .collect()
    }

    #[tokio::test]
    async fn test_mysql_clean_database() {
        let registry = registry();
        let executor = MemoryExecutor::new();
        let orchestrator = MigrationOrchestrator::new(&executor, &registry, Driver::MySql.profile());

        let outcome = orchestrator.run().await;
        assert_eq!(outcome.status(), FinalStatus::Completed);

        let drop = outcome.phase(Phase::Drop).unwrap();
        assert_eq!(drop.applied, 0);
        assert_eq!(drop.unchanged, registry.len());

        let applied = executor.applied().await;
        let created = creates(&applied);
        assert_eq!(created.len(), registry.len());
        assert!(created.iter().all(|e| e.sql.ends_with("ENGINE=InnoDB")));

        let constraint = outcome.phase(Phase::Constraint).unwrap();
        assert!(!constraint.skipped);
        assert_eq!(constraint.applied, registry.foreign_key_count());
        assert_eq!(
            executor.constraints("user_hobbies").await.unwrap(),
            vec!["fk_user_hobbies_user_id", "fk_user_hobbies_hobby_id"]
        );
    }

    #[tokio::test]
    async fn test_sqlite_populated_schema() {
        let registry = registry();
        let executor = MemoryExecutor::new()
            .with_table("auths", ["id", "email"])
            .with_table("users", ["id", "id_auth"])
            .with_table("posts", ["id"])
            .with_table("hobbies", ["id", "hobby"])
            .with_table("user_hobbies", ["user_id", "hobby_id"]);
        let orchestrator = MigrationOrchestrator::new(&executor, &registry, Driver::Sqlite.profile());

        let outcome = orchestrator.run().await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.phase(Phase::Drop).unwrap().applied, registry.len());
        assert!(outcome.phase(Phase::Constraint).unwrap().skipped);

        let applied = executor.applied().await;
        let dropped = drops(&applied);
        for dependent in ["posts", "user_hobbies"] {
            let child = dropped.iter().position(|t| *t == dependent).unwrap();
            let parent = dropped.iter().position(|t| *t == "users").unwrap();
            assert!(child < parent);
        }

        let created = creates(&applied);
        assert_eq!(created.len(), registry.len());
        assert!(created.iter().all(|e| !e.sql.contains("ENGINE")));
        assert!(applied.iter().all(|e| e.kind() != ChangeKind::AddForeignKey));
    }

    #[tokio::test]
    async fn test_postgres_locked_table_during_drop() {
        let registry = registry();
        let executor = MemoryExecutor::new()
            .with_table("hobbies", ["id", "hobby"])
            .fail_on("hobbies", ChangeKind::DropTable, "canceling statement due to lock timeout");
        let orchestrator =
            MigrationOrchestrator::new(&executor, &registry, Driver::Postgres.profile());

        let outcome = orchestrator.run().await;
        assert_eq!(outcome.status(), FinalStatus::Failed);

        let drop = outcome.phase(Phase::Drop).unwrap();
        assert_eq!(drop.errors.len(), 1);
        assert_eq!(drop.errors[0].table(), "hobbies");
        assert!(drop.errors[0].to_string().contains("lock timeout"));

        // The surviving table is left alone; everything else is created.
        let migrate = outcome.phase(Phase::Migrate).unwrap();
        assert!(migrate.succeeded());
        assert_eq!(migrate.unchanged, 1);
        assert_eq!(creates(&executor.applied().await).len(), registry.len() - 1);

        let constraint = outcome.phase(Phase::Constraint).unwrap();
        assert!(constraint.succeeded());
        assert_eq!(constraint.applied, registry.foreign_key_count());
    }

    #[tokio::test]
    async fn test_mysql_invalid_column_for_one_table() {
        let registry = registry();
        let executor = MemoryExecutor::new().fail_on(
            "posts",
            ChangeKind::CreateTable,
            "Invalid default value for 'title'",
        );
        let orchestrator = MigrationOrchestrator::new(&executor, &registry, Driver::MySql.profile());

        let outcome = orchestrator.run().await;
        assert_eq!(outcome.status(), FinalStatus::Failed);

        let migrate = outcome.phase(Phase::Migrate).unwrap();
        assert_eq!(migrate.errors.len(), 1);
        assert_eq!(migrate.errors[0].table(), "posts");
        assert_eq!(
            executor.table_names().await,
            vec!["auths", "hobbies", "user_hobbies", "users"]
        );

        // Every relation is still attempted, and only the one on posts fails.
        let constraint = outcome.phase(Phase::Constraint).unwrap();
        assert_eq!(
            constraint.applied + constraint.errors.len(),
            registry.foreign_key_count()
        );
        assert_eq!(constraint.errors.len(), 1);
        assert_eq!(constraint.errors[0].table(), "posts");
    }

    #[tokio::test]
    async fn test_migrate_phase_is_idempotent() {
        let registry = registry();
        let executor = MemoryExecutor::new();
        let orchestrator =
            MigrationOrchestrator::new(&executor, &registry, Driver::Postgres.profile());

        assert!(orchestrator.migrate_phase().await.succeeded());
        let columns = executor.columns("users").await;
        let applied = executor.applied().await.len();

        let second = orchestrator.migrate_phase().await;
        assert!(second.succeeded());
        assert_eq!(second.applied, 0);
        assert_eq!(second.unchanged, registry.len());
        assert_eq!(executor.columns("users").await, columns);
        assert_eq!(executor.applied().await.len(), applied);
    }

    #[tokio::test]
    async fn test_migrate_adds_missing_columns_only() {
        let registry = registry();
        let executor = MemoryExecutor::new().with_table("auths", ["id", "legacy_flag"]);
        let orchestrator = MigrationOrchestrator::new(&executor, &registry, Driver::MySql.profile());

        assert!(orchestrator.migrate_phase().await.succeeded());

        let columns = executor.columns("auths").await.unwrap();
        assert_eq!(columns, vec!["id", "legacy_flag", "email"]);
        for table in registry.tables() {
            let live = executor.columns(&table.name).await.unwrap();
            for column in table.column_names() {
                assert!(live.iter().any(|c| c == column));
            }
        }
    }

    #[tokio::test]
    async fn test_clean_drop_leaves_no_registered_tables() {
        let registry = registry();
        let executor = MemoryExecutor::new();
        let orchestrator = MigrationOrchestrator::new(&executor, &registry, Driver::MySql.profile());

        orchestrator.migrate_phase().await;
        orchestrator.constraint_phase().await;

        let drop = orchestrator.drop_phase().await;
        assert!(drop.succeeded());
        assert_eq!(drop.applied, registry.len());
        assert!(executor.table_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_constraint_phase_is_gated_by_driver() {
        let registry = registry();

        let executor = MemoryExecutor::new();
        let sqlite = MigrationOrchestrator::new(&executor, &registry, Driver::Sqlite.profile());
        sqlite.migrate_phase().await;
        let before = executor.applied().await.len();
        let result = sqlite.constraint_phase().await;
        assert!(result.skipped && result.succeeded());
        assert_eq!(executor.applied().await.len(), before);

        let executor = MemoryExecutor::new();
        let postgres = MigrationOrchestrator::new(&executor, &registry, Driver::Postgres.profile());
        postgres.migrate_phase().await;
        let result = postgres.constraint_phase().await;
        let added: Vec<_> = executor
            .applied()
            .await
            .into_iter()
            .filter_map(|e| match e.action {
                DiffAction::AddForeignKey { constraint, .. } => Some(constraint),
                _ => None,
            })
            .collect();
        assert_eq!(result.applied, registry.foreign_key_count());
        assert_eq!(added.len(), registry.foreign_key_count());
    }
}
