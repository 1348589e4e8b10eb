use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::attempt::{AssessmentAttempt, AttemptStatus, Phase};
use crate::models::catalog::{Category, McQuestion, Scenario};
use crate::models::proctor::{FlagKind, ProctorFlags};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAttemptRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerSelectedRequest {
    #[validate(length(min = 1, max = 128))]
    pub question_id: String,
    #[validate(length(min = 1, max = 128))]
    pub option_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScenarioTextRequest {
    #[validate(length(max = 20000))]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub kind: FlagKind,
}

pub mod answer;
pub mod attempt;
pub mod catalog;
pub mod proctor;
pub mod result;
pub mod timer;

/// Candidate-facing option: point values stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub category: Category,
    pub prompt: String,
    pub options: Vec<OptionView>,
}

impl From<&McQuestion> for QuestionView {
    fn from(question: &McQuestion) -> Self {
        Self {
            id: question.id.clone(),
            category: question.category,
            prompt: question.prompt.clone(),
            options: question
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id.clone(),
                    text: o.text.clone(),
                })
                .collect(),
        }
    }
}

/// Candidate-facing scenario: the keyword list stays server-side.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioView {
    pub id: String,
    pub title: String,
    pub prompt: String,
    pub min_words: usize,
    pub max_words: usize,
}

impl From<&Scenario> for ScenarioView {
    fn from(scenario: &Scenario) -> Self {
        Self {
            id: scenario.id.clone(),
            title: scenario.title.clone(),
            prompt: scenario.prompt.clone(),
            min_words: scenario.min_words,
            max_words: scenario.max_words,
        }
    }
}

/// Snapshot returned to the host after every state mutation, for rendering
/// timers and progress. Scoring data (option points, keywords, result) is
/// deliberately absent.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptView {
    pub attempt_id: String,
    pub user_id: String,
    pub status: AttemptStatus,
    pub phase: Phase,
    pub current_question: usize,
    pub questions: Vec<QuestionView>,
    pub scenario: ScenarioView,
    /// Ids of questions answered so far.
    pub answered: Vec<String>,
    pub scenario_response: String,
    pub part_time_left: u32,
    pub question_time_left: u32,
    pub proctor_flags: ProctorFlags,
    pub started_at: DateTime<Utc>,
    pub deadline_at: DateTime<Utc>,
}

impl From<&AssessmentAttempt> for AttemptView {
    fn from(attempt: &AssessmentAttempt) -> Self {
        Self {
            attempt_id: attempt.id.clone(),
            user_id: attempt.user_id.clone(),
            status: attempt.status,
            phase: attempt.phase,
            current_question: attempt.current_question,
            questions: attempt.questions.iter().map(QuestionView::from).collect(),
            scenario: ScenarioView::from(&attempt.scenario),
            answered: attempt.mc_answers.keys().cloned().collect(),
            scenario_response: attempt.scenario_response.clone(),
            part_time_left: attempt.part_time_left,
            question_time_left: attempt.question_time_left,
            proctor_flags: attempt.proctor_flags.clone(),
            started_at: attempt.started_at,
            deadline_at: attempt.deadline_at,
        }
    }
}
