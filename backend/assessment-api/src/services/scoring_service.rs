use std::collections::BTreeMap;

use regex::Regex;

use crate::config::ScoringSettings;
use crate::models::answer::{McAnswer, ScenarioAnswer};
use crate::models::catalog::{Category, McQuestion, Scenario};
use crate::models::proctor::ProctorFlags;
use crate::models::result::{AssessmentResult, BadgeTier};

/// Points available for keyword coverage in the scenario score.
const KEYWORD_POINTS_MAX: f64 = 5.0;
/// Length compliance: full points within the word bounds, one point for
/// over-length responses, nothing for under-length ones (too little content
/// is the stronger negative signal).
const LENGTH_POINTS_IN_RANGE: i32 = 2;
const LENGTH_POINTS_OVER: i32 = 1;
const LENGTH_POINTS_UNDER: i32 = 0;
/// Scenario sub-score ceiling: KEYWORD_POINTS_MAX + LENGTH_POINTS_IN_RANGE.
const SCENARIO_SCORE_MAX: i32 = 7;

/// Scores a free-text scenario response. Pure function: word count by
/// whitespace split, case-insensitive keyword coverage weighted at 5 of 7
/// points, length compliance at 2. A blank response scores 0 outright.
pub fn score_scenario_response(text: &str, scenario: &Scenario) -> ScenarioAnswer {
    let word_count = text.split_whitespace().count();
    if word_count == 0 {
        return ScenarioAnswer {
            text: text.to_string(),
            score: 0,
            matched_keywords: Vec::new(),
            word_count: 0,
        };
    }

    let matched_keywords: Vec<String> = scenario
        .keywords
        .iter()
        .filter(|keyword| keyword_matches(text, keyword))
        .cloned()
        .collect();

    let coverage = if scenario.keywords.is_empty() {
        0.0
    } else {
        matched_keywords.len() as f64 / scenario.keywords.len() as f64
    };
    let keyword_points = (coverage * KEYWORD_POINTS_MAX).round() as i32;

    let length_points = if (scenario.min_words..=scenario.max_words).contains(&word_count) {
        LENGTH_POINTS_IN_RANGE
    } else if word_count > scenario.max_words {
        LENGTH_POINTS_OVER
    } else {
        LENGTH_POINTS_UNDER
    };

    ScenarioAnswer {
        text: text.to_string(),
        score: (keyword_points + length_points).clamp(0, SCENARIO_SCORE_MAX),
        matched_keywords,
        word_count,
    }
}

/// Case-insensitive whole-word match; multi-word keywords match as phrases.
fn keyword_matches(text: &str, keyword: &str) -> bool {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword))) {
        Ok(re) => re.is_match(text),
        // An unbuildable pattern falls back to a plain substring check
        Err(_) => text.to_lowercase().contains(&keyword.to_lowercase()),
    }
}

/// Aggregates a completed attempt into the final result. Never errors:
/// partial or empty attempts produce the floor result, not an exception.
pub fn calculate_assessment_result(
    questions: &[McQuestion],
    mc_answers: &BTreeMap<String, McAnswer>,
    scenario_answer: &ScenarioAnswer,
    proctor_flags: &ProctorFlags,
    scoring: &ScoringSettings,
) -> AssessmentResult {
    let raw: i32 = mc_answers.values().map(|a| a.points.max(0)).sum();
    let max_raw: i32 = questions.iter().map(|q| q.max_points()).sum();

    // Linear scaling against the maximum achievable raw sum of the drawn set
    let part1_score = if max_raw > 0 {
        ((f64::from(raw) / f64::from(max_raw)) * f64::from(scoring.part1_max_score)).round() as i32
    } else {
        0
    }
    .clamp(0, scoring.part1_max_score);

    // The scenario sub-score is already on the 0..=7 scale; scaling here is
    // the identity under the default configuration
    let part2_score = scenario_answer.score.clamp(0, scoring.part2_max_score);

    let total_score = part1_score + part2_score;
    let passed = total_score >= scoring.passing_score;

    let max_total = scoring.part1_max_score + scoring.part2_max_score;
    let ratio = if max_total > 0 {
        f64::from(total_score) / f64::from(max_total)
    } else {
        0.0
    };
    let badge = if !passed {
        BadgeTier::None
    } else if ratio >= scoring.gold_threshold {
        BadgeTier::Gold
    } else if ratio >= scoring.silver_threshold {
        BadgeTier::Silver
    } else {
        BadgeTier::Bronze
    };

    AssessmentResult {
        total_score,
        part1_score,
        part2_score,
        category_scores: category_breakdown(questions, mc_answers),
        passed,
        badge,
        proctor_flags: proctor_flags.clone(),
    }
}

/// Percentage of achievable points per category, over the drawn question
/// set. Categories absent from the draw report 0.
fn category_breakdown(
    questions: &[McQuestion],
    mc_answers: &BTreeMap<String, McAnswer>,
) -> BTreeMap<Category, f64> {
    let mut earned: BTreeMap<Category, i32> = BTreeMap::new();
    let mut achievable: BTreeMap<Category, i32> = BTreeMap::new();

    for question in questions {
        *achievable.entry(question.category).or_default() += question.max_points();
        if let Some(answer) = mc_answers.get(&question.id) {
            *earned.entry(question.category).or_default() += answer.points.max(0);
        }
    }

    Category::ALL
        .iter()
        .map(|category| {
            let max = achievable.get(category).copied().unwrap_or(0);
            let pct = if max > 0 {
                f64::from(earned.get(category).copied().unwrap_or(0)) / f64::from(max) * 100.0
            } else {
                0.0
            };
            (*category, pct)
        })
        .collect()
}
