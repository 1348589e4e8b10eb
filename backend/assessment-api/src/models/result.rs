use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::catalog::Category;
use crate::models::proctor::ProctorFlags;

/// Badge tier derived from the total score. `None` means the attempt did not
/// pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    Gold,
    Silver,
    Bronze,
    None,
}

impl BadgeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeTier::Gold => "gold",
            BadgeTier::Silver => "silver",
            BadgeTier::Bronze => "bronze",
            BadgeTier::None => "none",
        }
    }
}

/// Final assessment outcome. Derived from a submitted attempt; read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub total_score: i32,
    pub part1_score: i32,
    pub part2_score: i32,
    /// Percentage of achievable points per competency category, 0.0 when the
    /// drawn question set carried no question of that category.
    pub category_scores: BTreeMap<Category, f64>,
    pub passed: bool,
    pub badge: BadgeTier,
    pub proctor_flags: ProctorFlags,
}
