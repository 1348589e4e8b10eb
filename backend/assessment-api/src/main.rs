#![allow(dead_code)]

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use closebase_assessment_api::{
    config::Config,
    create_router,
    services::{content_service, sweeper, AppState, LoggingCheckpointSink},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "closebase_assessment_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Closebase assessment API");

    // Load configuration
    let config = Config::load().expect("Failed to load configuration");
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    // Load and validate the question/scenario catalog; a broken catalog
    // means the assessment is unavailable, so fail at startup
    let catalog = content_service::load_catalog(
        &config.catalog_path,
        config.assessment.questions_per_attempt,
    )
    .expect("Failed to load assessment catalog");

    let listen_addr = config.listen_addr.clone();

    // Build application state
    let app_state = Arc::new(AppState::new(config, catalog, Arc::new(LoggingCheckpointSink)));

    // Background timer sweep drives all attempt countdowns
    sweeper::spawn(app_state.clone());

    // Build router
    let app = create_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&listen_addr).await.unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
