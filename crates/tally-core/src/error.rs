use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable error codes attached to diagnostics.
///
/// None of these abort a computation; they describe why one issue or one
/// project was left out of (or passed through) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ConfigParseError,
    InvalidClassification,
    MissingClassification,
    MalformedTimestamp,
    MissingHistory,
    BatchLimitReached,
    Cancelled,
}

impl ErrorCode {
    /// Every code in catalog order.
    pub const ALL: [Self; 7] = [
        Self::ConfigParseError,
        Self::InvalidClassification,
        Self::MissingClassification,
        Self::MalformedTimestamp,
        Self::MissingHistory,
        Self::BatchLimitReached,
        Self::Cancelled,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidClassification => "E1002",
            Self::MissingClassification => "E1003",
            Self::MalformedTimestamp => "E2001",
            Self::MissingHistory => "E2002",
            Self::BatchLimitReached => "E5001",
            Self::Cancelled => "E5002",
        }
    }

    /// Short human-facing summary for logs and exported reports.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Classification config parse error",
            Self::InvalidClassification => "Invalid field classification",
            Self::MissingClassification => "No classification for project",
            Self::MalformedTimestamp => "Malformed timestamp",
            Self::MissingHistory => "Issue history not found",
            Self::BatchLimitReached => "Batch unit limit reached",
            Self::Cancelled => "Computation cancelled",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix the TOML syntax of the classification file."),
            Self::InvalidClassification => {
                Some("The open default must not also be listed as a closed value.")
            }
            Self::MissingClassification => {
                Some("Add a [projects.<key>] table; until then no rules apply to this project.")
            }
            Self::MalformedTimestamp => {
                Some("Use RFC 3339 or YYYY-MM-DD[ HH:MM:SS] timestamps in the event log.")
            }
            Self::MissingHistory => None,
            Self::BatchLimitReached => Some("Raise max_units or narrow the requested scope."),
            Self::Cancelled => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
