use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use chrono::Utc;
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::{
    error::AppError,
    models::attempt::AttemptStatus,
    models::timer::{AttemptSubmitted, TimerEvent, TimerTick},
    services::AppState,
};

/// SSE endpoint for timer events
/// GET /api/v1/attempts/{id}/stream
pub async fn attempt_stream(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Client connected to SSE stream: attempt={}", attempt_id);

    // Verify the attempt exists before opening the stream
    if !state.attempts.read().await.contains_key(&attempt_id) {
        return Err(AppError::NotFound("Attempt not found".to_string()));
    }

    let tick_interval = tick_interval_ms();
    let max_ticks = max_stream_duration_seconds();
    tracing::info!(
        "Starting SSE stream: attempt={}, max_duration={}s, tick_interval={}ms",
        attempt_id,
        max_ticks,
        tick_interval
    );
    let stream = create_timer_stream(state, attempt_id, max_ticks, tick_interval);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn max_stream_duration_seconds() -> u32 {
    std::env::var("SSE_MAX_STREAM_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(3600)
}

fn tick_interval_ms() -> u64 {
    std::env::var("SSE_TICK_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(1000)
}

/// Stream of timer events. Re-reads the live attempt each tick, so the
/// reported countdowns are the sweep-driven ones, not a detached copy.
fn create_timer_stream(
    state: Arc<AppState>,
    attempt_id: String,
    max_ticks: u32,
    tick_interval_ms: u64,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(
        (state, attempt_id, 0u32, false),
        move |(state, id, elapsed, final_sent)| async move {
            if final_sent || elapsed > max_ticks {
                return None;
            }

            let snapshot = { state.attempts.read().await.get(&id).cloned() };
            let attempt = snapshot?;

            if attempt.status == AttemptStatus::Submitted {
                // Send final attempt-submitted event once
                let submitted_event = TimerEvent::AttemptSubmitted(AttemptSubmitted {
                    attempt_id: id.clone(),
                    timestamp: Utc::now(),
                    message: "Attempt submitted".to_string(),
                });

                let event = Event::default()
                    .event(submitted_event.event_name())
                    .data(submitted_event.to_sse_data());

                tracing::info!("Attempt stream finished: attempt={}", id);
                return Some((Ok(event), (state, id, elapsed, true)));
            }

            let tick_event = TimerEvent::TimerTick(TimerTick {
                attempt_id: id.clone(),
                phase: attempt.phase,
                part_seconds_left: attempt.part_time_left,
                question_seconds_left: attempt.question_time_left,
                timestamp: Utc::now(),
            });

            let event = Event::default()
                .event(tick_event.event_name())
                .data(tick_event.to_sse_data());

            // Wait 1 second before next tick
            sleep(Duration::from_millis(tick_interval_ms)).await;

            Some((Ok(event), (state, id, elapsed + 1, false)))
        },
    )
}
