use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::AttemptEvent,
        proctor::FlagKind,
        AnswerSelectedRequest, AttemptView, CreateAttemptRequest, FlagRequest,
        ScenarioTextRequest,
    },
    services::{attempt_service::AttemptService, AppState},
};

pub async fn create_attempt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    tracing::info!("Creating attempt for user_id={}", req.user_id);

    let service = AttemptService::new(state);
    let attempt = service.create_attempt(&req).await?;
    Ok((StatusCode::CREATED, Json(AttemptView::from(&attempt))))
}

pub async fn get_attempt(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = AttemptService::new(state);
    let attempt = service.get_attempt(&attempt_id).await?;
    Ok(Json(AttemptView::from(&attempt)))
}

pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
    Json(req): Json<AnswerSelectedRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AttemptService::new(state);
    let attempt = service
        .apply_event(
            &attempt_id,
            AttemptEvent::AnswerSelected {
                question_id: req.question_id,
                option_id: req.option_id,
            },
        )
        .await?;
    Ok(Json(AttemptView::from(&attempt)))
}

pub async fn advance_question(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = AttemptService::new(state);
    let attempt = service
        .apply_event(&attempt_id, AttemptEvent::NextQuestion)
        .await?;
    Ok(Json(AttemptView::from(&attempt)))
}

pub async fn update_scenario(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
    Json(req): Json<ScenarioTextRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AttemptService::new(state);
    let attempt = service
        .apply_event(&attempt_id, AttemptEvent::ScenarioChanged { text: req.text })
        .await?;
    Ok(Json(AttemptView::from(&attempt)))
}

/// Explicit submission. Responds with the final result; repeating the call
/// returns the same result again. 409 if the attempt never reached the
/// scenario phase.
pub async fn submit_attempt(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = AttemptService::new(state);
    let attempt = service
        .apply_event(&attempt_id, AttemptEvent::ScenarioSubmitted)
        .await?;

    attempt.result.clone().map(Json).ok_or_else(|| {
        AppError::Conflict("Attempt is not in the scenario phase".to_string())
    })
}

pub async fn report_flag(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
    Json(req): Json<FlagRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = match req.kind {
        FlagKind::FocusLost => AttemptEvent::FocusLost,
        FlagKind::Paste => AttemptEvent::PasteDetected,
    };

    let service = AttemptService::new(state);
    let attempt = service.apply_event(&attempt_id, event).await?;
    Ok(Json(AttemptView::from(&attempt)))
}

pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = AttemptService::new(state);
    let result = service.result(&attempt_id).await?;
    Ok(Json(result))
}
