use std::fmt;

use tracing::{error, info, warn};

use super::error::MigrationError;

/// The three phases of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Drop,
    Migrate,
    Constraint,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Drop => write!(f, "drop"),
            Phase::Migrate => write!(f, "migrate"),
            Phase::Constraint => write!(f, "constraint"),
        }
    }
}

/// Result of one phase.
#[derive(Debug)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Statements executed successfully.
    pub applied: usize,
    /// Tables that needed no work.
    pub unchanged: usize,
    /// The phase did not apply to the active driver.
    pub skipped: bool,
    /// Failures, in the order they occurred.
    pub errors: Vec<MigrationError>,
}

impl PhaseResult {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            applied: 0,
            unchanged: 0,
            skipped: false,
            errors: Vec::new(),
        }
    }

    /// A phase that was not entered. Skipping is not a failure.
    pub fn skipped(phase: Phase) -> Self {
        Self {
            skipped: true,
            ..Self::new(phase)
        }
    }

    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn record_applied(&mut self) {
        self.applied += 1;
    }

    pub fn record_unchanged(&mut self) {
        self.unchanged += 1;
    }

    /// Record a failure and report it immediately.
    pub fn record_failure(&mut self, failure: MigrationError) {
        error!(phase = %self.phase, table = failure.table(), "{}", failure);
        self.errors.push(failure);
    }
}

/// Collects phase results into one outcome without stopping later phases.
#[derive(Debug, Default)]
pub struct OutcomeAccumulator {
    results: Vec<PhaseResult>,
}

impl OutcomeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a phase result.
    pub fn record(&mut self, result: PhaseResult) -> &PhaseResult {
        if result.skipped {
            info!(phase = %result.phase, "Phase skipped");
        } else if result.succeeded() {
            info!(
                phase = %result.phase,
                applied = result.applied,
                unchanged = result.unchanged,
                "Phase completed"
            );
        } else {
            warn!(
                phase = %result.phase,
                failures = result.errors.len(),
                "Phase completed with failures"
            );
        }

        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    /// True while no recorded phase has a failure.
    pub fn succeeded(&self) -> bool {
        self.results.iter().all(PhaseResult::succeeded)
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().map(|r| r.errors.len()).sum()
    }

    pub fn final_status(&self) -> FinalStatus {
        if self.succeeded() {
            FinalStatus::Completed
        } else {
            FinalStatus::Failed
        }
    }

    pub fn finish(self) -> ProcessOutcome {
        ProcessOutcome {
            phases: self.results,
        }
    }
}

/// Aggregate of every phase of one run.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub phases: Vec<PhaseResult>,
}

impl ProcessOutcome {
    /// Succeeded iff every phase succeeded.
    pub fn succeeded(&self) -> bool {
        self.phases.iter().all(PhaseResult::succeeded)
    }

    pub fn status(&self) -> FinalStatus {
        if self.succeeded() {
            FinalStatus::Completed
        } else {
            FinalStatus::Failed
        }
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phases.iter().find(|r| r.phase == phase)
    }

    /// Every failure across all phases.
    pub fn errors(&self) -> impl Iterator<Item = &MigrationError> {
        self.phases.iter().flat_map(|r| r.errors.iter())
    }
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalStatus {
    Completed,
    Failed,
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalStatus::Completed => write!(f, "completed"),
            FinalStatus::Failed => write!(f, "failed"),
        }
    }
}
