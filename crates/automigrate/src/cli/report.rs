use console::{style, StyledObject};

use automigrate_core::driver::{Dialect, Driver};
use automigrate_runtime::migrations::{FinalStatus, Phase, PhaseResult, ProcessOutcome};

/// Leading symbol of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Done,
    Info,
    Failed,
}

impl Mark {
    fn styled(self) -> StyledObject<&'static str> {
        match self {
            Mark::Done => style("✓").green(),
            Mark::Info => style("ℹ").blue(),
            Mark::Failed => style("✗").red(),
        }
    }
}

pub fn print_header(title: &str) {
    println!();
    println!(
        "  {}  {} {}",
        style("⚒️").bold(),
        style("automigrate").bold().cyan(),
        title
    );
    println!();
}

/// One status block per phase, then the final line.
pub fn print_outcome(outcome: &ProcessOutcome, driver: Driver) {
    for result in &outcome.phases {
        for (mark, line) in phase_lines(result, driver) {
            println!("  {} {}", mark.styled(), line);
        }
    }

    println!();
    let mark = match outcome.status() {
        FinalStatus::Completed => Mark::Done,
        FinalStatus::Failed => Mark::Failed,
    };
    println!("  {} {}", mark.styled().bold(), final_message(outcome));
    println!();
}

fn final_message(outcome: &ProcessOutcome) -> String {
    match outcome.status() {
        FinalStatus::Completed => "Auto migration is completed!".to_string(),
        FinalStatus::Failed => format!(
            "Auto migration failed! ({} error(s))",
            outcome.errors().count()
        ),
    }
}

fn phase_lines(result: &PhaseResult, driver: Driver) -> Vec<(Mark, String)> {
    if !result.succeeded() {
        return result
            .errors
            .iter()
            .map(|error| (Mark::Failed, format!("[{}] {}", error.phase(), error)))
            .collect();
    }

    let line = match result.phase {
        Phase::Drop if result.applied == 0 => (Mark::Info, "No old tables to delete".to_string()),
        Phase::Drop => (
            Mark::Done,
            format!("Old tables are deleted! ({})", result.applied),
        ),
        Phase::Migrate => (
            Mark::Done,
            format!(
                "New tables are migrated successfully! ({} change(s), {} up to date)",
                result.applied, result.unchanged
            ),
        ),
        Phase::Constraint if result.skipped => (
            Mark::Info,
            format!("Foreign keys are declared inline for {}, nothing to add", driver),
        ),
        Phase::Constraint => (
            Mark::Done,
            format!("Foreign key constraints are created! ({})", result.applied),
        ),
    };
    vec![line]
}

/// Capabilities of the active driver, as shown by `check` and `plan`.
pub fn print_profile(driver: Driver) {
    let profile = driver.profile();
    println!("  {} Driver: {}", style("→").dim(), style(driver).cyan());
    println!(
        "  {} Table option: {}",
        style("→").dim(),
        profile.table_creation_option().unwrap_or("none")
    );
    println!(
        "  {} Explicit foreign keys: {}",
        style("→").dim(),
        if profile.requires_explicit_foreign_keys() {
            "yes"
        } else {
            "no"
        }
    );
}
