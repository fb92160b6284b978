use serde::{Deserialize, Serialize};

use super::IssueRef;

/// A defect as seen by the quality KPIs: current state plus the attributes
/// the filter pipeline looks at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Defect {
    pub issue: IssueRef,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub root_causes: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub resolution: Option<String>,
    /// Keys of the stories this defect is linked to.
    #[serde(default)]
    pub linked_stories: Vec<String>,
}

impl Defect {
    #[must_use]
    pub fn new(issue: IssueRef) -> Self {
        Self {
            issue,
            priority: None,
            root_causes: Vec::new(),
            status: String::new(),
            resolution: None,
            linked_stories: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    #[must_use]
    pub fn with_root_causes<I, S>(mut self, root_causes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_causes = root_causes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    #[must_use]
    pub fn linked_to<I, S>(mut self, stories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.linked_stories = stories.into_iter().map(Into::into).collect();
        self
    }
}
