use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AssessmentConfig, ScoringSettings, TimingSettings};
use crate::models::answer::{McAnswer, ScenarioAnswer};
use crate::models::catalog::{McQuestion, Scenario};
use crate::models::proctor::ProctorFlags;
use crate::models::result::AssessmentResult;
use crate::services::scoring_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    MultipleChoice,
    Scenario,
}

/// Everything the host can feed into a running attempt.
#[derive(Debug, Clone)]
pub enum AttemptEvent {
    AnswerSelected {
        question_id: String,
        option_id: String,
    },
    NextQuestion,
    QuestionTimerTick,
    PartTimerTick,
    ScenarioChanged {
        text: String,
    },
    ScenarioSubmitted,
    FocusLost,
    PasteDetected,
}

impl AttemptEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptEvent::AnswerSelected { .. } => "answer_selected",
            AttemptEvent::NextQuestion => "next_question",
            AttemptEvent::QuestionTimerTick => "question_timer_tick",
            AttemptEvent::PartTimerTick => "part_timer_tick",
            AttemptEvent::ScenarioChanged { .. } => "scenario_changed",
            AttemptEvent::ScenarioSubmitted => "scenario_submitted",
            AttemptEvent::FocusLost => "focus_lost",
            AttemptEvent::PasteDetected => "paste_detected",
        }
    }
}

/// Side effects a transition asks the host shell to perform. The state
/// machine itself never does I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Snapshot should be handed to the checkpoint sink (fire-and-forget).
    Checkpoint,
    /// The attempt reached its terminal state and the final result exists.
    /// Emitted exactly once per attempt.
    Submitted,
}

/// Aggregate root for one candidate's timed assessment. Owned by a single
/// candidate for its lifetime; all mutation goes through [`apply`].
///
/// [`apply`]: AssessmentAttempt::apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentAttempt {
    pub id: String,
    pub user_id: String,
    pub status: AttemptStatus,
    pub phase: Phase,
    pub questions: Vec<McQuestion>,
    pub scenario: Scenario,
    /// 0-based index into `questions`, meaningful only in phase 1.
    pub current_question: usize,
    /// One entry per answered question; unanswered questions are absent.
    pub mc_answers: BTreeMap<String, McAnswer>,
    /// Free-text draft, mutable until submission.
    pub scenario_response: String,
    pub part_time_left: u32,
    pub question_time_left: u32,
    pub proctor_flags: ProctorFlags,
    pub started_at: DateTime<Utc>,
    /// Wall-clock hard stop. The sweep force-submits past this point even if
    /// individual ticks were missed.
    pub deadline_at: DateTime<Utc>,
    pub scenario_answer: Option<ScenarioAnswer>,
    pub result: Option<AssessmentResult>,
    // Constants captured at creation so config changes cannot shift a
    // running attempt.
    timing: TimingSettings,
    scoring: ScoringSettings,
}

impl AssessmentAttempt {
    pub fn new(
        user_id: &str,
        questions: Vec<McQuestion>,
        scenario: Scenario,
        cfg: &AssessmentConfig,
    ) -> Self {
        let now = Utc::now();
        let total_seconds = i64::from(cfg.timing.part1_seconds) + i64::from(cfg.timing.part2_seconds);

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: AttemptStatus::InProgress,
            phase: Phase::MultipleChoice,
            questions,
            scenario,
            current_question: 0,
            mc_answers: BTreeMap::new(),
            scenario_response: String::new(),
            part_time_left: cfg.timing.part1_seconds,
            question_time_left: cfg.timing.question_seconds,
            proctor_flags: ProctorFlags::default(),
            started_at: now,
            deadline_at: now + chrono::Duration::seconds(total_seconds),
            scenario_answer: None,
            result: None,
            timing: cfg.timing.clone(),
            scoring: cfg.scoring.clone(),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_in_progress() && now >= self.deadline_at
    }

    /// Applies one event and returns the effects the host shell must handle.
    /// Events that do not fit the current state are ignored (logged, no state
    /// change) rather than erroring: a stale event must never crash an exam
    /// in progress, and a submitted attempt is immutable.
    pub fn apply(&mut self, event: AttemptEvent) -> Vec<Effect> {
        if self.status == AttemptStatus::Submitted {
            tracing::debug!(
                "attempt {}: ignoring {} after submission",
                self.id,
                event.kind()
            );
            return Vec::new();
        }

        match event {
            AttemptEvent::AnswerSelected {
                question_id,
                option_id,
            } => self.record_answer(&question_id, &option_id),
            AttemptEvent::NextQuestion => {
                if self.phase != Phase::MultipleChoice {
                    tracing::debug!("attempt {}: next_question outside phase 1 ignored", self.id);
                    return Vec::new();
                }
                self.advance_question()
            }
            AttemptEvent::QuestionTimerTick => {
                if self.phase != Phase::MultipleChoice {
                    return Vec::new();
                }
                self.question_time_left = self.question_time_left.saturating_sub(1);
                if self.question_time_left == 0 {
                    self.advance_question()
                } else {
                    Vec::new()
                }
            }
            AttemptEvent::PartTimerTick => {
                self.part_time_left = self.part_time_left.saturating_sub(1);
                if self.part_time_left > 0 {
                    return Vec::new();
                }
                match self.phase {
                    Phase::MultipleChoice => {
                        // Time is up for part 1 regardless of how many
                        // questions were reached.
                        self.enter_scenario_phase();
                        Vec::new()
                    }
                    Phase::Scenario => self.submit(),
                }
            }
            AttemptEvent::ScenarioChanged { text } => {
                if self.phase != Phase::Scenario {
                    tracing::debug!(
                        "attempt {}: scenario_changed outside phase 2 ignored",
                        self.id
                    );
                    return Vec::new();
                }
                self.scenario_response = text;
                vec![Effect::Checkpoint]
            }
            AttemptEvent::ScenarioSubmitted => {
                if self.phase != Phase::Scenario {
                    tracing::debug!(
                        "attempt {}: scenario_submitted outside phase 2 ignored",
                        self.id
                    );
                    return Vec::new();
                }
                self.submit()
            }
            AttemptEvent::FocusLost => {
                self.proctor_flags.focus_changes += 1;
                Vec::new()
            }
            AttemptEvent::PasteDetected => {
                self.proctor_flags.paste_count += 1;
                Vec::new()
            }
        }
    }

    /// Forced submission for attempts past their wall-clock deadline. Runs
    /// the same transitions the part timer would have driven.
    pub fn force_expire(&mut self) -> Vec<Effect> {
        if self.status == AttemptStatus::Submitted {
            return Vec::new();
        }
        tracing::info!(
            "attempt {}: wall-clock deadline passed, forcing submission",
            self.id
        );
        if self.phase == Phase::MultipleChoice {
            self.enter_scenario_phase();
        }
        self.part_time_left = 0;
        self.submit()
    }

    fn record_answer(&mut self, question_id: &str, option_id: &str) -> Vec<Effect> {
        if self.phase != Phase::MultipleChoice {
            tracing::debug!(
                "attempt {}: answer_selected outside phase 1 ignored",
                self.id
            );
            return Vec::new();
        }
        let Some(question) = self.questions.iter().find(|q| q.id == question_id) else {
            tracing::warn!(
                "attempt {}: answer for unknown question {} ignored",
                self.id,
                question_id
            );
            return Vec::new();
        };
        let Some(option) = question.option(option_id) else {
            tracing::warn!(
                "attempt {}: unknown option {} for question {} ignored",
                self.id,
                option_id,
                question_id
            );
            return Vec::new();
        };

        self.mc_answers.insert(
            question_id.to_string(),
            McAnswer {
                question_id: question_id.to_string(),
                option_id: option.id.clone(),
                points: option.points,
            },
        );
        vec![Effect::Checkpoint]
    }

    /// Shared by the manual advance and the question timer expiring; both
    /// paths behave identically.
    fn advance_question(&mut self) -> Vec<Effect> {
        if self.current_question + 1 < self.questions.len() {
            self.current_question += 1;
            self.question_time_left = self.timing.question_seconds;
        } else {
            self.enter_scenario_phase();
        }
        Vec::new()
    }

    fn enter_scenario_phase(&mut self) {
        self.phase = Phase::Scenario;
        self.part_time_left = self.timing.part2_seconds;
        self.current_question = 0;
        self.question_time_left = 0;
        tracing::info!("attempt {}: entering scenario phase", self.id);
    }

    fn submit(&mut self) -> Vec<Effect> {
        let scenario_answer =
            scoring_service::score_scenario_response(&self.scenario_response, &self.scenario);
        let result = scoring_service::calculate_assessment_result(
            &self.questions,
            &self.mc_answers,
            &scenario_answer,
            &self.proctor_flags,
            &self.scoring,
        );
        tracing::info!(
            "attempt {}: submitted, total={}, passed={}",
            self.id,
            result.total_score,
            result.passed
        );
        self.scenario_answer = Some(scenario_answer);
        self.result = Some(result);
        self.status = AttemptStatus::Submitted;
        vec![Effect::Checkpoint, Effect::Submitted]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{Category, QuestionOption};

    fn test_question(id: &str, category: Category) -> McQuestion {
        McQuestion {
            id: id.to_string(),
            category,
            prompt: format!("prompt {}", id),
            options: vec![
                QuestionOption {
                    id: "a".to_string(),
                    text: "best".to_string(),
                    points: 5,
                },
                QuestionOption {
                    id: "b".to_string(),
                    text: "okay".to_string(),
                    points: 3,
                },
                QuestionOption {
                    id: "c".to_string(),
                    text: "weak".to_string(),
                    points: 1,
                },
                QuestionOption {
                    id: "d".to_string(),
                    text: "poor".to_string(),
                    points: 0,
                },
            ],
        }
    }

    fn test_scenario() -> Scenario {
        Scenario {
            id: "s1".to_string(),
            title: "Preiseinwand".to_string(),
            prompt: "Der Kunde sagt, das Produkt sei zu teuer.".to_string(),
            keywords: vec![
                "verstehen".to_string(),
                "nutzen".to_string(),
                "frage".to_string(),
            ],
            min_words: 5,
            max_words: 50,
        }
    }

    fn test_attempt() -> AssessmentAttempt {
        let categories = Category::ALL;
        let questions = (0..20)
            .map(|i| test_question(&format!("q{:02}", i), categories[i % 4]))
            .collect();
        AssessmentAttempt::new(
            "user-1",
            questions,
            test_scenario(),
            &AssessmentConfig::default(),
        )
    }

    #[test]
    fn new_attempt_starts_in_phase_one_with_full_budgets() {
        let attempt = test_attempt();
        assert_eq!(attempt.status, AttemptStatus::InProgress);
        assert_eq!(attempt.phase, Phase::MultipleChoice);
        assert_eq!(attempt.current_question, 0);
        assert_eq!(attempt.part_time_left, 420);
        assert_eq!(attempt.question_time_left, 21);
        assert!(attempt.mc_answers.is_empty());
    }

    #[test]
    fn answer_selection_captures_points_and_overwrites() {
        let mut attempt = test_attempt();

        let effects = attempt.apply(AttemptEvent::AnswerSelected {
            question_id: "q00".to_string(),
            option_id: "b".to_string(),
        });
        assert_eq!(effects, vec![Effect::Checkpoint]);
        assert_eq!(attempt.mc_answers["q00"].points, 3);

        // Re-selecting overwrites the previous entry
        attempt.apply(AttemptEvent::AnswerSelected {
            question_id: "q00".to_string(),
            option_id: "a".to_string(),
        });
        assert_eq!(attempt.mc_answers.len(), 1);
        assert_eq!(attempt.mc_answers["q00"].points, 5);
    }

    #[test]
    fn answer_for_unknown_question_or_option_is_ignored() {
        let mut attempt = test_attempt();

        let effects = attempt.apply(AttemptEvent::AnswerSelected {
            question_id: "nope".to_string(),
            option_id: "a".to_string(),
        });
        assert!(effects.is_empty());
        assert!(attempt.mc_answers.is_empty());

        let effects = attempt.apply(AttemptEvent::AnswerSelected {
            question_id: "q00".to_string(),
            option_id: "zz".to_string(),
        });
        assert!(effects.is_empty());
        assert!(attempt.mc_answers.is_empty());
    }

    #[test]
    fn question_timer_expiry_advances_and_resets() {
        let mut attempt = test_attempt();
        for _ in 0..21 {
            attempt.apply(AttemptEvent::QuestionTimerTick);
        }
        assert_eq!(attempt.current_question, 1);
        assert_eq!(attempt.question_time_left, 21);
        assert_eq!(attempt.phase, Phase::MultipleChoice);
    }

    #[test]
    fn manual_advance_matches_timer_path() {
        let mut attempt = test_attempt();
        attempt.apply(AttemptEvent::NextQuestion);
        assert_eq!(attempt.current_question, 1);
        assert_eq!(attempt.question_time_left, 21);
    }

    #[test]
    fn last_question_expiry_enters_scenario_phase() {
        let mut attempt = test_attempt();
        for _ in 0..19 {
            attempt.apply(AttemptEvent::NextQuestion);
        }
        assert_eq!(attempt.current_question, 19);

        for _ in 0..21 {
            attempt.apply(AttemptEvent::QuestionTimerTick);
        }
        assert_eq!(attempt.phase, Phase::Scenario);
        assert_eq!(attempt.part_time_left, 180);
        assert_eq!(attempt.current_question, 0);
        assert_eq!(attempt.status, AttemptStatus::InProgress);
    }

    #[test]
    fn part_timer_expiry_forces_scenario_phase() {
        let mut attempt = test_attempt();
        // Answer a couple of questions, then let the part budget run out
        attempt.apply(AttemptEvent::AnswerSelected {
            question_id: "q00".to_string(),
            option_id: "a".to_string(),
        });
        for _ in 0..420 {
            attempt.apply(AttemptEvent::PartTimerTick);
        }
        assert_eq!(attempt.phase, Phase::Scenario);
        assert_eq!(attempt.part_time_left, 180);
        assert_eq!(attempt.current_question, 0);
        // Recorded answers survive the forced transition
        assert_eq!(attempt.mc_answers.len(), 1);
    }

    #[test]
    fn part_timer_expiry_in_scenario_phase_submits() {
        let mut attempt = test_attempt();
        for _ in 0..420 {
            attempt.apply(AttemptEvent::PartTimerTick);
        }
        assert_eq!(attempt.phase, Phase::Scenario);

        let mut submitted_effects = 0;
        for _ in 0..180 {
            let effects = attempt.apply(AttemptEvent::PartTimerTick);
            submitted_effects += effects
                .iter()
                .filter(|e| **e == Effect::Submitted)
                .count();
        }
        assert_eq!(attempt.status, AttemptStatus::Submitted);
        assert_eq!(submitted_effects, 1);
        assert!(attempt.result.is_some());
    }

    #[test]
    fn question_ticks_are_ignored_in_scenario_phase() {
        let mut attempt = test_attempt();
        for _ in 0..420 {
            attempt.apply(AttemptEvent::PartTimerTick);
        }
        let before = attempt.part_time_left;
        attempt.apply(AttemptEvent::QuestionTimerTick);
        assert_eq!(attempt.part_time_left, before);
        assert_eq!(attempt.status, AttemptStatus::InProgress);
    }

    #[test]
    fn stale_answer_after_phase_transition_is_ignored() {
        let mut attempt = test_attempt();
        for _ in 0..420 {
            attempt.apply(AttemptEvent::PartTimerTick);
        }
        let effects = attempt.apply(AttemptEvent::AnswerSelected {
            question_id: "q00".to_string(),
            option_id: "a".to_string(),
        });
        assert!(effects.is_empty());
        assert!(attempt.mc_answers.is_empty());
    }

    #[test]
    fn scenario_edits_only_apply_in_scenario_phase() {
        let mut attempt = test_attempt();
        let effects = attempt.apply(AttemptEvent::ScenarioChanged {
            text: "too early".to_string(),
        });
        assert!(effects.is_empty());
        assert_eq!(attempt.scenario_response, "");

        for _ in 0..420 {
            attempt.apply(AttemptEvent::PartTimerTick);
        }
        let effects = attempt.apply(AttemptEvent::ScenarioChanged {
            text: "ich will den kunden verstehen".to_string(),
        });
        assert_eq!(effects, vec![Effect::Checkpoint]);
        assert_eq!(attempt.scenario_response, "ich will den kunden verstehen");
    }

    #[test]
    fn manual_submit_is_idempotent() {
        let mut attempt = test_attempt();
        for _ in 0..420 {
            attempt.apply(AttemptEvent::PartTimerTick);
        }
        attempt.apply(AttemptEvent::ScenarioChanged {
            text: "ich moechte verstehen welchen nutzen der kunde sucht und stelle eine frage"
                .to_string(),
        });

        let first = attempt.apply(AttemptEvent::ScenarioSubmitted);
        assert!(first.contains(&Effect::Submitted));

        let second = attempt.apply(AttemptEvent::ScenarioSubmitted);
        assert!(second.is_empty());
        assert_eq!(attempt.status, AttemptStatus::Submitted);
    }

    #[test]
    fn submitted_attempt_is_byte_for_byte_immutable() {
        let mut attempt = test_attempt();
        for _ in 0..420 {
            attempt.apply(AttemptEvent::PartTimerTick);
        }
        attempt.apply(AttemptEvent::ScenarioSubmitted);
        let before = serde_json::to_string(&attempt).unwrap();

        attempt.apply(AttemptEvent::AnswerSelected {
            question_id: "q00".to_string(),
            option_id: "a".to_string(),
        });
        attempt.apply(AttemptEvent::PartTimerTick);
        attempt.apply(AttemptEvent::QuestionTimerTick);
        attempt.apply(AttemptEvent::ScenarioChanged {
            text: "late".to_string(),
        });
        attempt.apply(AttemptEvent::ScenarioSubmitted);
        attempt.apply(AttemptEvent::FocusLost);
        attempt.apply(AttemptEvent::PasteDetected);

        let after = serde_json::to_string(&attempt).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn proctor_flags_accumulate_without_affecting_scoring() {
        let mut attempt = test_attempt();
        attempt.apply(AttemptEvent::FocusLost);
        attempt.apply(AttemptEvent::FocusLost);
        attempt.apply(AttemptEvent::PasteDetected);
        assert_eq!(attempt.proctor_flags.focus_changes, 2);
        assert_eq!(attempt.proctor_flags.paste_count, 1);
        assert_eq!(attempt.phase, Phase::MultipleChoice);
        assert_eq!(attempt.part_time_left, 420);
    }

    #[test]
    fn force_expire_submits_from_phase_one() {
        let mut attempt = test_attempt();
        let effects = attempt.force_expire();
        assert!(effects.contains(&Effect::Submitted));
        assert_eq!(attempt.status, AttemptStatus::Submitted);
        let result = attempt.result.as_ref().unwrap();
        assert_eq!(result.total_score, 0);
        assert!(!result.passed);

        // Expiring again is a no-op
        assert!(attempt.force_expire().is_empty());
    }
}
