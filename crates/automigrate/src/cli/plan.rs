use anyhow::Result;
use clap::Parser;
use console::style;

use automigrate_core::schema::{ModelRegistry, TableDef};
use automigrate_runtime::migrations::{MemoryExecutor, MigrationOrchestrator};

use super::context::{Context, GlobalArgs};
use super::report;
use super::exit_status;

/// Show the statements a run would issue against an empty database.
#[derive(Parser, Debug, Default)]
pub struct PlanCommand {
    /// Print the statements as JSON instead of SQL.
    #[arg(long)]
    pub json: bool,
}

impl PlanCommand {
    pub async fn execute(self, args: &GlobalArgs) -> Result<u8> {
        let context = Context::load(args)?;
        let driver = context.offline_driver()?;

        let executor = MemoryExecutor::new();
        let orchestrator = MigrationOrchestrator::new(&executor, &context.registry, driver.profile());
        let outcome = orchestrator.run().await;
        let applied = executor.applied().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&applied)?);
        } else {
            report::print_header("plan");
            report::print_profile(driver);
            println!();
            print_order(&context.registry);

            println!("  {} Statements:", style("→").dim());
            for entry in &applied {
                println!();
                println!("  {} {}", style("--").dim(), style(&entry.details).dim());
                println!("{};", entry.sql);
            }

            report::print_outcome(&outcome, driver);
        }

        Ok(exit_status(&outcome))
    }
}

fn print_order(registry: &ModelRegistry) {
    let names = |tables: Vec<&TableDef>| {
        tables
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!(
        "  {} Create order: {}",
        style("→").dim(),
        style(names(registry.create_order())).cyan()
    );
    println!(
        "  {} Drop order:   {}",
        style("→").dim(),
        style(names(registry.drop_order())).cyan()
    );
    println!();
}
