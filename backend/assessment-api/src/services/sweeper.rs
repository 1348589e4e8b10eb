use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::time::{Duration, MissedTickBehavior};

use crate::metrics::SWEEPER_TICKS_TOTAL;
use crate::models::attempt::{AssessmentAttempt, AttemptEvent, Effect, Phase};
use crate::services::attempt_service::AttemptService;
use crate::services::AppState;

/// Spawns the 1 Hz timer sweep. Each pass drives the per-second countdowns
/// of every active attempt and force-submits anything past its wall-clock
/// deadline, so timing survives missed ticks.
pub fn spawn(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match sweep(&state).await {
                Ok(()) => SWEEPER_TICKS_TOTAL.with_label_values(&["success"]).inc(),
                Err(e) => {
                    SWEEPER_TICKS_TOTAL.with_label_values(&["error"]).inc();
                    tracing::error!("Timer sweep failed: {:#}", e);
                }
            }
        }
    })
}

/// One sweep pass. The part-level timer ticks before the question-level one
/// so the coarser transition wins when both would expire in the same second.
pub async fn sweep(state: &Arc<AppState>) -> Result<()> {
    let now = Utc::now();
    let mut pending: Vec<(AssessmentAttempt, Vec<Effect>)> = Vec::new();

    {
        let mut store = state.attempts.write().await;
        for attempt in store.values_mut() {
            if !attempt.is_in_progress() {
                continue;
            }

            let mut effects = if attempt.is_overdue(now) {
                attempt.force_expire()
            } else {
                let mut effects = attempt.apply(AttemptEvent::PartTimerTick);
                if attempt.is_in_progress() && attempt.phase == Phase::MultipleChoice {
                    effects.extend(attempt.apply(AttemptEvent::QuestionTimerTick));
                }
                effects
            };

            effects.dedup();
            if !effects.is_empty() {
                pending.push((attempt.clone(), effects));
            }
        }
    }

    // Effects run after the store lock is released
    let service = AttemptService::new(state.clone());
    for (snapshot, effects) in pending {
        service.handle_effects(&snapshot, &effects).await;
    }

    Ok(())
}
