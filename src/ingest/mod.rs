//! Ingestion scheduling
//!
//! This module drives the recurring fetch-then-store cycle:
//! - Picking the next usable credential from the pool
//! - Running the fetch and routing its outcome
//! - Suspending credentials that hit their quota
//! - Committing batches without blocking the timer
//! - Bounded shutdown of in-flight work

mod report;
mod scheduler;

pub use report::{CycleReport, CycleState};
pub use scheduler::{IngestScheduler, SchedulerSettings};

use serde::Deserialize;

/// How cycles are laid out over the credential pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulerMode {
    /// One timer; each tick uses the next usable credential
    #[default]
    Rotating,

    /// One worker per credential, each on its own timer
    PerCredential,
}
