use std::sync::Arc;

use axum::Router;
use closebase_assessment_api::{
    config::{AssessmentConfig, Config, TimingSettings},
    create_router,
    models::catalog::{Catalog, Category, McQuestion, QuestionOption, Scenario},
    services::{AppState, MemoryCheckpointSink},
};

pub fn test_question(id: &str, category: Category) -> McQuestion {
    McQuestion {
        id: id.to_string(),
        category,
        prompt: format!("Testfrage {}", id),
        options: vec![
            QuestionOption {
                id: "a".to_string(),
                text: "beste Antwort".to_string(),
                points: 5,
            },
            QuestionOption {
                id: "b".to_string(),
                text: "gute Antwort".to_string(),
                points: 3,
            },
            QuestionOption {
                id: "c".to_string(),
                text: "schwache Antwort".to_string(),
                points: 1,
            },
            QuestionOption {
                id: "d".to_string(),
                text: "schlechte Antwort".to_string(),
                points: 0,
            },
        ],
    }
}

pub fn test_scenario(id: &str) -> Scenario {
    Scenario {
        id: id.to_string(),
        title: "Preiseinwand".to_string(),
        prompt: "Der Kunde findet das Angebot zu teuer.".to_string(),
        keywords: vec![
            "verstehen".to_string(),
            "Nutzen".to_string(),
            "Frage".to_string(),
        ],
        min_words: 10,
        max_words: 50,
    }
}

pub fn test_catalog() -> Catalog {
    Catalog {
        questions: (0..24)
            .map(|i| test_question(&format!("q{:02}", i), Category::ALL[i % 4]))
            .collect(),
        scenarios: vec![test_scenario("s1"), test_scenario("s2")],
    }
}

pub fn test_config() -> Config {
    test_config_with_timing(TimingSettings::default())
}

pub fn test_config_with_timing(timing: TimingSettings) -> Config {
    Config {
        listen_addr: "127.0.0.1:0".to_string(),
        catalog_path: "unused".to_string(),
        assessment: AssessmentConfig {
            timing,
            rng_seed: Some(7),
            ..AssessmentConfig::default()
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub checkpoints: Arc<MemoryCheckpointSink>,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_timing(TimingSettings::default()).await
}

pub async fn create_test_app_with_timing(timing: TimingSettings) -> TestApp {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let checkpoints = Arc::new(MemoryCheckpointSink::default());
    let state = Arc::new(AppState::new(
        test_config_with_timing(timing),
        test_catalog(),
        checkpoints.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        checkpoints,
    }
}
