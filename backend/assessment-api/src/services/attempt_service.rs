use std::sync::Arc;

use crate::error::AppError;
use crate::metrics::{
    record_checkpoint_save, ATTEMPTS_ACTIVE, ATTEMPTS_TOTAL, ATTEMPT_EVENTS_TOTAL,
    BADGES_AWARDED_TOTAL, PROCTOR_FLAGS_TOTAL, RESULTS_TOTAL,
};
use crate::models::attempt::{AssessmentAttempt, AttemptEvent, Effect};
use crate::models::result::AssessmentResult;
use crate::models::CreateAttemptRequest;
use crate::services::{content_service, proctor_service, AppState};
use crate::utils::retry::{retry_with_policy, RetryPolicy};

pub struct AttemptService {
    state: Arc<AppState>,
}

impl AttemptService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Creates an attempt with freshly randomized content and registers it
    /// with the in-memory store.
    pub async fn create_attempt(
        &self,
        req: &CreateAttemptRequest,
    ) -> Result<AssessmentAttempt, AppError> {
        let cfg = &self.state.config.assessment;
        let mut rng = content_service::attempt_rng(cfg.rng_seed);

        let questions = content_service::select_random_questions(
            &self.state.catalog.questions,
            cfg.questions_per_attempt,
            &mut rng,
        )?;
        let scenario =
            content_service::select_random_scenario(&self.state.catalog.scenarios, &mut rng)?;

        let attempt = AssessmentAttempt::new(&req.user_id, questions, scenario, cfg);
        let snapshot = attempt.clone();

        self.state
            .attempts
            .write()
            .await
            .insert(attempt.id.clone(), attempt);

        ATTEMPTS_TOTAL.with_label_values(&["created"]).inc();
        ATTEMPTS_ACTIVE.inc();
        tracing::info!(
            "Attempt created: {} for user: {}",
            snapshot.id,
            snapshot.user_id
        );

        self.spawn_checkpoint(snapshot.clone());
        Ok(snapshot)
    }

    pub async fn get_attempt(&self, attempt_id: &str) -> Result<AssessmentAttempt, AppError> {
        self.state
            .attempts
            .read()
            .await
            .get(attempt_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }

    /// Applies one host event to an attempt and handles the resulting
    /// effects. Events are serialized per attempt by the store's write lock,
    /// so a stale event cannot overtake a timer-driven transition.
    pub async fn apply_event(
        &self,
        attempt_id: &str,
        event: AttemptEvent,
    ) -> Result<AssessmentAttempt, AppError> {
        let event_kind = event.kind();
        let is_flag = matches!(
            event,
            AttemptEvent::FocusLost | AttemptEvent::PasteDetected
        );

        let (snapshot, effects) = {
            let mut store = self.state.attempts.write().await;
            let attempt = store
                .get_mut(attempt_id)
                .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
            let effects = attempt.apply(event);
            (attempt.clone(), effects)
        };

        ATTEMPT_EVENTS_TOTAL.with_label_values(&[event_kind]).inc();
        if is_flag {
            PROCTOR_FLAGS_TOTAL.with_label_values(&[event_kind]).inc();
            proctor_service::note_flags(&snapshot, &self.state.config.assessment.proctor);
        }

        self.handle_effects(&snapshot, &effects).await;
        Ok(snapshot)
    }

    /// The final result of a submitted attempt. 409 until submission.
    pub async fn result(&self, attempt_id: &str) -> Result<AssessmentResult, AppError> {
        let attempt = self.get_attempt(attempt_id).await?;
        attempt.result.clone().ok_or_else(|| {
            AppError::Conflict("Attempt has not been submitted yet".to_string())
        })
    }

    /// Dispatches transition effects. Mid-attempt checkpoints are
    /// fire-and-forget; the submission checkpoint is awaited because the
    /// final snapshot is the one persistence must not lose.
    pub(crate) async fn handle_effects(&self, snapshot: &AssessmentAttempt, effects: &[Effect]) {
        let submitted = effects.contains(&Effect::Submitted);

        if submitted {
            self.record_submission(snapshot);
            self.final_checkpoint(snapshot).await;
        } else if effects.contains(&Effect::Checkpoint) {
            self.spawn_checkpoint(snapshot.clone());
        }
    }

    fn record_submission(&self, snapshot: &AssessmentAttempt) {
        ATTEMPTS_TOTAL.with_label_values(&["submitted"]).inc();
        ATTEMPTS_ACTIVE.dec();
        if let Some(result) = &snapshot.result {
            let passed_label = if result.passed { "true" } else { "false" };
            RESULTS_TOTAL.with_label_values(&[passed_label]).inc();
            BADGES_AWARDED_TOTAL
                .with_label_values(&[result.badge.as_str()])
                .inc();
        }
    }

    /// Background save; a failure is logged and never rolls back attempt
    /// state.
    fn spawn_checkpoint(&self, snapshot: AssessmentAttempt) {
        let sink = self.state.checkpoints.clone();
        tokio::spawn(async move {
            let res =
                retry_with_policy(RetryPolicy::default(), || async { sink.save(&snapshot).await })
                    .await;
            record_checkpoint_save(res.is_ok());
            if let Err(e) = res {
                tracing::error!(
                    "Background checkpoint save failed for attempt {}: {:#}",
                    snapshot.id,
                    e
                );
            }
        });
    }

    /// Blocking save of the terminal snapshot, with aggressive retries.
    /// Log-and-continue on permanent failure: the result already exists in
    /// memory and must still reach the caller.
    async fn final_checkpoint(&self, snapshot: &AssessmentAttempt) {
        let sink = self.state.checkpoints.clone();
        let res = retry_with_policy(RetryPolicy::aggressive(), || async {
            sink.save(snapshot).await
        })
        .await;
        record_checkpoint_save(res.is_ok());
        if let Err(e) = res {
            tracing::error!(
                "Final checkpoint save failed for attempt {}: {:#}",
                snapshot.id,
                e
            );
        }
    }
}
