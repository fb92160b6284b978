#![forbid(unsafe_code)]
//! tally-metrics library.
//!
//! Lifecycle analytics over the `tally-core` model: per-day status and field
//! replay, defect reopen detection, completion-cycle resolution for issues
//! duplicated across overlapping sprints, and the defect filter pipeline
//! every quality KPI counts through.
//!
//! # Conventions
//!
//! - **Errors**: per-issue and per-project failures never abort a batch; they
//!   are reported as [`tally_core::Diagnostic`] entries beside the output.
//! - **Parallelism**: independent units fan out on the rayon pool through
//!   [`batch::fan_out`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod aging;
pub mod batch;
pub mod cycles;
pub mod defects;
pub mod kpi;
pub mod reopen;
pub mod replay;
pub mod velocity;

pub use batch::BatchOptions;
pub use cycles::{CompletionCycles, DuplicateSet, HistoryLookup, SprintSelection};
pub use defects::{FilterRules, exclude};
pub use reopen::{ReopenSummary, ReopenTransition, ReopenWindow};
pub use replay::{DateFieldIndex, FieldSelector, ReplayRequest, replay_by_field, replay_by_status};
