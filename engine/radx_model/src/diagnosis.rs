use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// A label with its sampled confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub condition: Condition,
    pub confidence: f64,
}

/// The path that produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// A filename hint short-circuited the cascade.
    Hint,
    /// A region cascade rule fired.
    Cascade,
    /// No cascade applied; age-based defaults were used.
    Demographic,
    /// Prior-weighted draw from the adjusted region table.
    Prior,
    /// An internal error was absorbed into a uniform guess.
    Fallback,
    /// The region is not supported.
    Unsupported,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::Hint => "hint",
            DecisionSource::Cascade => "cascade",
            DecisionSource::Demographic => "demographic",
            DecisionSource::Prior => "prior",
            DecisionSource::Fallback => "fallback",
            DecisionSource::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
