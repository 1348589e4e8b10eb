use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Competency categories the question pool is tagged with. The tags are
/// configuration: a catalog without them cannot produce the per-category
/// breakdown and fails validation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Empathie,
    Akquise,
    Resilienz,
    Konfliktmanagement,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Empathie,
        Category::Akquise,
        Category::Resilienz,
        Category::Konfliktmanagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Empathie => "empathie",
            Category::Akquise => "akquise",
            Category::Resilienz => "resilienz",
            Category::Konfliktmanagement => "konfliktmanagement",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    pub points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McQuestion {
    pub id: String,
    pub category: Category,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
}

impl McQuestion {
    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Highest achievable point value for this question.
    pub fn max_points(&self) -> i32 {
        self.options.iter().map(|o| o.points).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub prompt: String,
    pub keywords: Vec<String>,
    pub min_words: usize,
    pub max_words: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub questions: Vec<McQuestion>,
    pub scenarios: Vec<Scenario>,
}

pub const MIN_OPTIONS_PER_QUESTION: usize = 3;
pub const MAX_OPTIONS_PER_QUESTION: usize = 5;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("question pool holds {found} questions, need at least {needed}")]
    PoolTooSmall { needed: usize, found: usize },

    #[error("catalog has no scenarios")]
    NoScenarios,

    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(String),

    #[error("question {id} has {count} options, expected {MIN_OPTIONS_PER_QUESTION} to {MAX_OPTIONS_PER_QUESTION}")]
    BadOptionCount { id: String, count: usize },

    #[error("question {question_id} has duplicate option id: {option_id}")]
    DuplicateOptionId {
        question_id: String,
        option_id: String,
    },

    #[error("scenario {0} has no keywords")]
    ScenarioWithoutKeywords(String),

    #[error("scenario {id} has inverted word bounds ({min_words}..{max_words})")]
    InvertedWordBounds {
        id: String,
        min_words: usize,
        max_words: usize,
    },
}

impl Catalog {
    /// Startup validation. Fails loudly instead of silently selecting fewer
    /// or duplicate items later.
    pub fn validate(&self, questions_per_attempt: usize) -> Result<(), CatalogError> {
        if self.questions.len() < questions_per_attempt {
            return Err(CatalogError::PoolTooSmall {
                needed: questions_per_attempt,
                found: self.questions.len(),
            });
        }
        if self.scenarios.is_empty() {
            return Err(CatalogError::NoScenarios);
        }

        let mut seen = std::collections::HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateQuestionId(question.id.clone()));
            }
            let count = question.options.len();
            if !(MIN_OPTIONS_PER_QUESTION..=MAX_OPTIONS_PER_QUESTION).contains(&count) {
                return Err(CatalogError::BadOptionCount {
                    id: question.id.clone(),
                    count,
                });
            }
            let mut option_ids = std::collections::HashSet::new();
            for option in &question.options {
                if !option_ids.insert(option.id.as_str()) {
                    return Err(CatalogError::DuplicateOptionId {
                        question_id: question.id.clone(),
                        option_id: option.id.clone(),
                    });
                }
            }
        }

        for scenario in &self.scenarios {
            if scenario.keywords.is_empty() {
                return Err(CatalogError::ScenarioWithoutKeywords(scenario.id.clone()));
            }
            if scenario.min_words > scenario.max_words {
                return Err(CatalogError::InvertedWordBounds {
                    id: scenario.id.clone(),
                    min_words: scenario.min_words,
                    max_words: scenario.max_words,
                });
            }
        }

        Ok(())
    }
}
