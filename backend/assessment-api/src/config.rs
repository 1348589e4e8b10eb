use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_CATALOG_PATH: &str = "assets/catalog.json";

/// Number of multiple-choice questions drawn per attempt.
pub const DEFAULT_QUESTIONS_PER_ATTEMPT: usize = 20;
/// Overall budget for part 1 (all multiple-choice questions): 7 minutes.
pub const DEFAULT_PART1_SECONDS: u32 = 420;
/// Countdown per multiple-choice question.
pub const DEFAULT_QUESTION_SECONDS: u32 = 21;
/// Overall budget for part 2 (scenario response): 3 minutes.
pub const DEFAULT_PART2_SECONDS: u32 = 180;

pub const DEFAULT_PART1_MAX_SCORE: i32 = 20;
pub const DEFAULT_PART2_MAX_SCORE: i32 = 7;
/// Pass bar: 19 of 27 total points (~70.4%).
pub const DEFAULT_PASSING_SCORE: i32 = 19;
/// Badge breakpoints as a fraction of the maximum total score.
pub const DEFAULT_GOLD_THRESHOLD: f64 = 0.90;
pub const DEFAULT_SILVER_THRESHOLD: f64 = 0.80;

/// Proctor flag counts at which a review warning is logged.
pub const DEFAULT_FOCUS_WARN_THRESHOLD: u32 = 3;
pub const DEFAULT_PASTE_WARN_THRESHOLD: u32 = 1;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub catalog_path: String,
    pub assessment: AssessmentConfig,
}

#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    pub questions_per_attempt: usize,
    pub timing: TimingSettings,
    pub scoring: ScoringSettings,
    pub proctor: ProctorSettings,
    /// Fixed seed for the content selector. Unset in production; set for
    /// reproducible runs and tests.
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    pub part1_seconds: u32,
    pub question_seconds: u32,
    pub part2_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub part1_max_score: i32,
    pub part2_max_score: i32,
    pub passing_score: i32,
    pub gold_threshold: f64,
    pub silver_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProctorSettings {
    pub focus_warn_threshold: u32,
    pub paste_warn_threshold: u32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            part1_seconds: DEFAULT_PART1_SECONDS,
            question_seconds: DEFAULT_QUESTION_SECONDS,
            part2_seconds: DEFAULT_PART2_SECONDS,
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            part1_max_score: DEFAULT_PART1_MAX_SCORE,
            part2_max_score: DEFAULT_PART2_MAX_SCORE,
            passing_score: DEFAULT_PASSING_SCORE,
            gold_threshold: DEFAULT_GOLD_THRESHOLD,
            silver_threshold: DEFAULT_SILVER_THRESHOLD,
        }
    }
}

impl Default for ProctorSettings {
    fn default() -> Self {
        Self {
            focus_warn_threshold: DEFAULT_FOCUS_WARN_THRESHOLD,
            paste_warn_threshold: DEFAULT_PASTE_WARN_THRESHOLD,
        }
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            questions_per_attempt: DEFAULT_QUESTIONS_PER_ATTEMPT,
            timing: TimingSettings::default(),
            scoring: ScoringSettings::default(),
            proctor: ProctorSettings::default(),
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let listen_addr = settings
            .get_string("server.listen_addr")
            .or_else(|_| env::var("LISTEN_ADDR"))
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        let catalog_path = settings
            .get_string("catalog.path")
            .or_else(|_| env::var("CATALOG_PATH"))
            .unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string());

        let assessment = AssessmentConfig {
            questions_per_attempt: get_usize(
                &settings,
                "assessment.questions_per_attempt",
                DEFAULT_QUESTIONS_PER_ATTEMPT,
            ),
            timing: TimingSettings {
                part1_seconds: get_u32(&settings, "assessment.part1_seconds", DEFAULT_PART1_SECONDS),
                question_seconds: get_u32(
                    &settings,
                    "assessment.question_seconds",
                    DEFAULT_QUESTION_SECONDS,
                ),
                part2_seconds: get_u32(&settings, "assessment.part2_seconds", DEFAULT_PART2_SECONDS),
            },
            scoring: ScoringSettings {
                part1_max_score: get_i32(
                    &settings,
                    "assessment.part1_max_score",
                    DEFAULT_PART1_MAX_SCORE,
                ),
                part2_max_score: get_i32(
                    &settings,
                    "assessment.part2_max_score",
                    DEFAULT_PART2_MAX_SCORE,
                ),
                passing_score: get_i32(&settings, "assessment.passing_score", DEFAULT_PASSING_SCORE),
                gold_threshold: get_f64(
                    &settings,
                    "assessment.gold_threshold",
                    DEFAULT_GOLD_THRESHOLD,
                ),
                silver_threshold: get_f64(
                    &settings,
                    "assessment.silver_threshold",
                    DEFAULT_SILVER_THRESHOLD,
                ),
            },
            proctor: ProctorSettings {
                focus_warn_threshold: get_u32(
                    &settings,
                    "assessment.focus_warn_threshold",
                    DEFAULT_FOCUS_WARN_THRESHOLD,
                ),
                paste_warn_threshold: get_u32(
                    &settings,
                    "assessment.paste_warn_threshold",
                    DEFAULT_PASTE_WARN_THRESHOLD,
                ),
            },
            rng_seed: settings
                .get_int("assessment.rng_seed")
                .ok()
                .and_then(|v| u64::try_from(v).ok())
                .or_else(|| {
                    env::var("RNG_SEED")
                        .ok()
                        .and_then(|v| v.parse::<u64>().ok())
                }),
        };

        Ok(Config {
            listen_addr,
            catalog_path,
            assessment,
        })
    }
}

fn get_u32(settings: &config::Config, key: &str, default: u32) -> u32 {
    settings
        .get_int(key)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

fn get_i32(settings: &config::Config, key: &str, default: i32) -> i32 {
    settings
        .get_int(key)
        .ok()
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(default)
}

fn get_usize(settings: &config::Config, key: &str, default: usize) -> usize {
    settings
        .get_int(key)
        .ok()
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

fn get_f64(settings: &config::Config, key: &str, default: f64) -> f64 {
    settings.get_float(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn load_uses_defaults_without_config_file() {
        std::env::remove_var("APP_ASSESSMENT__PASSING_SCORE");
        std::env::set_var("APP_ENV", "nonexistent");
        let config = Config::load().expect("load");
        assert_eq!(config.assessment.questions_per_attempt, 20);
        assert_eq!(config.assessment.timing.part1_seconds, 420);
        assert_eq!(config.assessment.timing.question_seconds, 21);
        assert_eq!(config.assessment.timing.part2_seconds, 180);
        assert_eq!(config.assessment.scoring.passing_score, 19);
        std::env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    fn env_overrides_passing_score() {
        std::env::set_var("APP_ENV", "nonexistent");
        std::env::set_var("APP_ASSESSMENT__PASSING_SCORE", "21");
        let config = Config::load().expect("load");
        assert_eq!(config.assessment.scoring.passing_score, 21);
        std::env::remove_var("APP_ASSESSMENT__PASSING_SCORE");
        std::env::remove_var("APP_ENV");
    }
}
