use anyhow::Result;
use clap::Parser;
use console::style;

use automigrate_runtime::migrations::{MigrationOrchestrator, SqlxExecutor};
use automigrate_runtime::Database;

use super::context::{Context, GlobalArgs};
use super::report;
use super::exit_status;

/// Drop every declared table, migrate them again and create foreign keys.
#[derive(Parser, Debug, Default)]
pub struct RunCommand {}

impl RunCommand {
    /// Execute the run command.
    pub async fn execute(self, args: &GlobalArgs) -> Result<u8> {
        let context = Context::load(args)?;
        let driver = context.connected_driver()?;

        report::print_header(&format!("v{}", env!("CARGO_PKG_VERSION")));
        println!(
            "  {} Synchronizing {} table(s) on {}",
            style("→").dim(),
            context.registry.len(),
            style(driver).cyan()
        );
        println!(
            "  {} {}",
            style("!").yellow().bold(),
            style("Every declared table is dropped first").yellow()
        );
        println!();

        let db = Database::from_config(&context.config.database).await?;
        let executor = SqlxExecutor::from_database(&db);
        let orchestrator = MigrationOrchestrator::new(&executor, &context.registry, db.profile());

        let outcome = orchestrator.run().await;
        db.close().await;

        report::print_outcome(&outcome, driver);

        Ok(exit_status(&outcome))
    }
}
