use serde::{Deserialize, Serialize};

/// Response captured for one multiple-choice question. The point value is
/// copied from the option at selection time, so later pool edits cannot
/// retroactively change scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McAnswer {
    pub question_id: String,
    pub option_id: String,
    pub points: i32,
}

/// Scored free-text scenario response, computed once at submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAnswer {
    pub text: String,
    pub score: i32,
    pub matched_keywords: Vec<String>,
    pub word_count: usize,
}
