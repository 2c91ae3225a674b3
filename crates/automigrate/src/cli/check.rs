use anyhow::Result;
use clap::Parser;
use console::style;

use automigrate_runtime::Database;

use super::context::{Context, GlobalArgs};
use super::report;
use super::EXIT_SUCCESS;

/// Validate configuration and schema, and test the connection.
#[derive(Parser, Debug, Default)]
pub struct CheckCommand {}

impl CheckCommand {
    pub async fn execute(self, args: &GlobalArgs) -> Result<u8> {
        let context = Context::load(args)?;
        let driver = context.connected_driver()?;

        report::print_header("check");
        println!(
            "  {} Schema: {} table(s), {} foreign key(s)",
            style("✓").green(),
            context.registry.len(),
            context.registry.foreign_key_count()
        );

        let db = Database::from_config(&context.config.database).await?;
        db.health_check().await?;
        db.close().await;

        println!("  {} Connection established", style("✓").green());
        report::print_profile(driver);
        println!();

        Ok(EXIT_SUCCESS)
    }
}
