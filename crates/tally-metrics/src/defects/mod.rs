//! Defect filter pipeline.
//!
//! Every quality KPI that counts defects counts the output of
//! [`filter::exclude`], never the raw defect set.

pub mod filter;
pub mod rca;

pub use filter::{FilterRules, exclude, passes_priority_rca, passes_rejection};
pub use rca::canonical_root_cause;
