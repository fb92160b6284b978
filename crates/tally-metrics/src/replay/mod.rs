//! Status history replay.
//!
//! # Overview
//!
//! Reconstructs, from each issue's append-only status log, which value the
//! issue held on every date of a range, and inverts that into a
//! cumulative-flow index (value → date → issues).
//!
//! ```text
//! IssueHistory ──resolve()──► ResolvedHistory
//!        ↓  engine::segments()          (per issue, parallel)
//! Vec<Segment>  (end-of-day value runs)
//!        ↓  status / field variant
//! partial DateFieldIndex                (per issue)
//!        ↓  DateFieldIndex::merge()     (union)
//! DateFieldIndex
//! ```
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use tally_metrics::replay::{ReplayRequest, replay_by_status};
//!
//! let request = ReplayRequest::new(range_start, today);
//! let out = replay_by_status(&issues, &classifications, &request);
//! for (date, open) in out.index.count_series("In Progress") {
//!     println!("{date} {open}");
//! }
//! ```

pub mod engine;
pub mod index;

pub use engine::{
    FieldSelector, ReplayOutput, ReplayRequest, Segment, UNDEFINED_FIELD_VALUE, replay_by_field,
    replay_by_status, segments,
};
pub use index::DateFieldIndex;
