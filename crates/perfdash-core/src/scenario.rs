//! Baseline / optimized cohort classification for task identifiers.

use serde::{Deserialize, Serialize};

/// Substring that marks a task identifier as a post-tuning run.
pub const OPTIMIZED_TOKEN: &str = "optimized";

/// Which performance cohort a task belongs to.
///
/// Every synthetic generator branches on this value so that independent
/// reads for the same task tell a consistent story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Pre-tuning run: higher latency, lower throughput, little cache reuse.
    #[default]
    Baseline,
    /// Post-tuning run: lower latency, higher throughput, high cache reuse.
    Optimized,
}

impl Scenario {
    pub fn is_optimized(self) -> bool {
        self == Scenario::Optimized
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Scenario::Baseline => "baseline",
            Scenario::Optimized => "optimized",
        };
        write!(f, "{s}")
    }
}

/// Classify a task identifier. Case-sensitive substring match; anything that
/// does not carry [`OPTIMIZED_TOKEN`] is a baseline run.
pub fn classify(task_id: &str) -> Scenario {
    if task_id.contains(OPTIMIZED_TOKEN) {
        Scenario::Optimized
    } else {
        Scenario::Baseline
    }
}
