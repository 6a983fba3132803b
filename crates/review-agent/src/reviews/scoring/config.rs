use serde::{Deserialize, Serialize};

pub const DEFAULT_SELF_WEIGHT: f64 = 30.0;
pub const DEFAULT_OTHER_WEIGHT: f64 = 70.0;

/// Weight percentages applied when a competency category has no explicit grading row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub default_self_weight: f64,
    pub default_other_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_self_weight: DEFAULT_SELF_WEIGHT,
            default_other_weight: DEFAULT_OTHER_WEIGHT,
        }
    }
}
