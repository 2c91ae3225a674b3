mod check;
mod context;
mod plan;
mod report;
mod run;

pub use check::CheckCommand;
pub use context::GlobalArgs;
pub use plan::PlanCommand;
pub use run::RunCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;

use automigrate_runtime::migrations::ProcessOutcome;

pub const EXIT_SUCCESS: u8 = 0;

/// At least one phase recorded a failure.
pub const EXIT_PHASE_FAILED: u8 = 1;

/// Configuration, schema or connection could not be set up.
pub const EXIT_SETUP_FAILED: u8 = 2;

/// Drop, recreate and constrain a declared set of tables.
#[derive(Parser)]
#[command(name = "automigrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Drop every declared table, migrate them again and create foreign keys.
    Run(RunCommand),

    /// Show the statements a run would issue against an empty database.
    Plan(PlanCommand),

    /// Validate configuration and schema, and test the connection.
    Check(CheckCommand),
}

/// Process exit status for a finished run.
pub fn exit_status(outcome: &ProcessOutcome) -> u8 {
    if outcome.succeeded() {
        EXIT_SUCCESS
    } else {
        EXIT_PHASE_FAILED
    }
}

impl Cli {
    /// Execute the command and map setup errors to their exit status.
    pub async fn run(self) -> u8 {
        match self.execute().await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("  {} {:#}", style("✗").red().bold(), e);
                EXIT_SETUP_FAILED
            }
        }
    }

    /// Execute the CLI command. `run` is the default.
    pub async fn execute(self) -> Result<u8> {
        match self.command {
            Some(Commands::Run(cmd)) => cmd.execute(&self.global).await,
            Some(Commands::Plan(cmd)) => cmd.execute(&self.global).await,
            Some(Commands::Check(cmd)) => cmd.execute(&self.global).await,
            None => RunCommand::default().execute(&self.global).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use automigrate_core::error::SyncError;
    use automigrate_runtime::migrations::{MigrationError, OutcomeAccumulator, Phase, PhaseResult};
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
        [[tables]]
        name = "auths"

        [[tables.fields]]
        name = "id"
        type = "i64"
        attributes = ["id_auto"]

        [[tables]]
        name = "users"

        [[tables.fields]]
        name = "id"
        type = "i64"
        attributes = ["id_auto"]

        [[tables.fields]]
        name = "id_auth"
        type = "i64"

        [[tables.foreign_keys]]
        column = "id_auth"
        references = "auths"
    "#;

    fn cli(dir: &Path, schema: &str, database_url: &str) -> Cli {
        let schema_path = dir.join("schema.toml");
        fs::write(&schema_path, schema).unwrap();

        Cli {
            command: Some(Commands::Run(RunCommand::default())),
            global: GlobalArgs {
                config: dir.join("absent.toml").to_string_lossy().into_owned(),
                driver: None,
                database_url: Some(database_url.to_string()),
                schema: Some(schema_path.to_string_lossy().into_owned()),
            },
        }
    }

    #[test]
    fn test_exit_status_follows_outcome() {
        let mut acc = OutcomeAccumulator::new();
        acc.record(PhaseResult::new(Phase::Drop));
        assert_eq!(exit_status(&acc.finish()), EXIT_SUCCESS);

        let mut acc = OutcomeAccumulator::new();
        let mut migrate = PhaseResult::new(Phase::Migrate);
        migrate.record_failure(MigrationError::Migrate {
            table: "users".to_string(),
            details: "Create table users".to_string(),
            source: SyncError::Database("permission denied".to_string()),
        });
        acc.record(migrate);
        acc.record(PhaseResult::skipped(Phase::Constraint));
        assert_eq!(exit_status(&acc.finish()), EXIT_PHASE_FAILED);
    }

    #[tokio::test]
    async fn test_run_against_sqlite_succeeds() {
        let dir = TempDir::new().unwrap();
        let code = cli(dir.path(), SCHEMA, "sqlite::memory:").run().await;
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_empty_schema_is_a_setup_failure() {
        let dir = TempDir::new().unwrap();
        let code = cli(dir.path(), "tables = []", "sqlite::memory:").run().await;
        assert_eq!(code, EXIT_SETUP_FAILED);
    }

    #[tokio::test]
    async fn test_missing_database_url_is_a_setup_failure() {
        let dir = TempDir::new().unwrap();
        let code = cli(dir.path(), SCHEMA, "").run().await;
        assert_eq!(code, EXIT_SETUP_FAILED);
    }

    #[test]
    fn test_cli_parse_default_command() {
        let cli = Cli::try_parse_from(["automigrate"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.global.config, "automigrate.toml");
    }

    #[test]
    fn test_cli_parse_plan_with_overrides() {
        let cli = Cli::try_parse_from([
            "automigrate",
            "plan",
            "--driver",
            "mysql",
            "--schema",
            "demos/gorest.toml",
            "--json",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Commands::Plan(ref cmd)) if cmd.json));
        assert_eq!(cli.global.driver.as_deref(), Some("mysql"));
        assert_eq!(cli.global.schema.as_deref(), Some("demos/gorest.toml"));
    }

    #[test]
    fn test_cli_parse_global_args_before_command() {
        let cli = Cli::try_parse_from([
            "automigrate",
            "--database-url",
            "sqlite://app.db",
            "check",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Check(_))));
        assert_eq!(cli.global.database_url.as_deref(), Some("sqlite://app.db"));
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["automigrate", "rollback"]).is_err());
    }
}
