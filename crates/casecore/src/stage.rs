use crate::{Record, StageError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identifiers of the complaint workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Intake,
    Validate,
    Investigate,
    Resolve,
    Close,
}

impl StageName {
    pub const ALL: [StageName; 5] = [
        StageName::Intake,
        StageName::Validate,
        StageName::Investigate,
        StageName::Resolve,
        StageName::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Intake => "intake",
            StageName::Validate => "validate",
            StageName::Investigate => "investigate",
            StageName::Resolve => "resolve",
            StageName::Close => "close",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core trait that every workflow stage implements
pub trait Stage: Send + Sync {
    /// Node this stage is bound to
    fn name(&self) -> StageName;

    /// Optional: one-line summary shown when listing a graph
    fn description(&self) -> &str {
        ""
    }

    /// Produce the next record from the current one.
    ///
    /// Implementations build their result through the record's overlay
    /// methods; the input record is left as it was.
    fn run(&self, record: &Record) -> Result<Record, StageError>;
}
