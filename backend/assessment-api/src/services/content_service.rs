use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use crate::models::catalog::{Catalog, CatalogError, McQuestion, Scenario};

/// Loads and validates the question/scenario catalog. Called once at
/// startup; a broken catalog aborts the service rather than producing
/// under-filled attempts later.
pub fn load_catalog(path: &str, questions_per_attempt: usize) -> Result<Catalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path))?;
    let catalog: Catalog =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse catalog: {}", path))?;
    catalog
        .validate(questions_per_attempt)
        .with_context(|| format!("Catalog validation failed: {}", path))?;

    tracing::info!(
        "Catalog loaded: {} questions, {} scenarios ({})",
        catalog.questions.len(),
        catalog.scenarios.len(),
        path
    );
    Ok(catalog)
}

/// Draws `n` distinct questions uniformly at random without replacement.
/// The draw is shuffled again so presentation order is independent of pool
/// order.
pub fn select_random_questions<R: Rng + ?Sized>(
    pool: &[McQuestion],
    n: usize,
    rng: &mut R,
) -> Result<Vec<McQuestion>, CatalogError> {
    if pool.len() < n {
        return Err(CatalogError::PoolTooSmall {
            needed: n,
            found: pool.len(),
        });
    }
    let mut drawn: Vec<McQuestion> = pool.choose_multiple(rng, n).cloned().collect();
    drawn.shuffle(rng);
    Ok(drawn)
}

/// Picks one scenario uniformly at random.
pub fn select_random_scenario<R: Rng + ?Sized>(
    pool: &[Scenario],
    rng: &mut R,
) -> Result<Scenario, CatalogError> {
    pool.choose(rng).cloned().ok_or(CatalogError::NoScenarios)
}

/// RNG for one attempt's content draw. Seeded for reproducible runs and
/// tests, OS entropy otherwise.
pub fn attempt_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
