//! Input data model: issue identity, raw status logs, defects, and the
//! per-project classification that gives raw values their meaning.

pub mod classification;
pub mod defect;
pub mod issue;

pub use classification::{
    ClassificationError, ClassificationSet, DEFAULT_OPEN_VALUE, DefectRules, FieldClassification,
    RejectionRule, contains_value, same_value,
};
pub use defect::Defect;
pub use issue::{
    IssueHistory, IssueRef, ResolveError, ResolvedEvent, ResolvedHistory, StatusChangeEvent,
};
