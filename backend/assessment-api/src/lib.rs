#![allow(dead_code)]

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // CORS for the browser-based exam UI
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to the app origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/attempts", attempts_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn attempts_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", post(handlers::attempts::create_attempt))
        .route("/{id}", get(handlers::attempts::get_attempt))
        .route("/{id}/answers", post(handlers::attempts::submit_answer))
        .route("/{id}/advance", post(handlers::attempts::advance_question))
        .route("/{id}/scenario", post(handlers::attempts::update_scenario))
        .route("/{id}/submit", post(handlers::attempts::submit_attempt))
        .route("/{id}/flags", post(handlers::attempts::report_flag))
        .route("/{id}/result", get(handlers::attempts::get_result))
        .route("/{id}/stream", get(handlers::sse::attempt_stream))
}
