use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::models::attempt::AssessmentAttempt;
use crate::models::catalog::Catalog;

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    /// Authoritative attempt state lives in memory until submission; the
    /// write lock also serializes events per attempt.
    pub attempts: RwLock<HashMap<String, AssessmentAttempt>>,
    pub checkpoints: Arc<dyn CheckpointSink>,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog, checkpoints: Arc<dyn CheckpointSink>) -> Self {
        Self {
            config,
            catalog: Arc::new(catalog),
            attempts: RwLock::new(HashMap::new()),
            checkpoints,
        }
    }
}

/// Host boundary for attempt snapshots. Saves are fire-and-forget during an
/// attempt; only the final submission save is awaited.
#[async_trait]
pub trait CheckpointSink: Send + Sync {
    async fn save(&self, attempt: &AssessmentAttempt) -> Result<()>;
}

/// Default sink: serializes the snapshot and hands it to the log stream. A
/// real host replaces this with its persistence adapter.
pub struct LoggingCheckpointSink;

#[async_trait]
impl CheckpointSink for LoggingCheckpointSink {
    async fn save(&self, attempt: &AssessmentAttempt) -> Result<()> {
        let snapshot =
            serde_json::to_string(attempt).context("Failed to serialize attempt snapshot")?;
        tracing::debug!(
            "checkpoint: attempt={} status={:?} bytes={}",
            attempt.id,
            attempt.status,
            snapshot.len()
        );
        Ok(())
    }
}

/// Sink capturing snapshots in memory, for tests.
#[derive(Default)]
pub struct MemoryCheckpointSink {
    pub saved: Mutex<Vec<AssessmentAttempt>>,
}

#[async_trait]
impl CheckpointSink for MemoryCheckpointSink {
    async fn save(&self, attempt: &AssessmentAttempt) -> Result<()> {
        self.saved.lock().await.push(attempt.clone());
        Ok(())
    }
}

pub mod attempt_service;
pub mod content_service;
pub mod proctor_service;
pub mod scoring_service;
pub mod sweeper;
