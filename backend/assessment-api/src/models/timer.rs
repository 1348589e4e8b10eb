use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::attempt::Phase;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TimerEvent {
    TimerTick(TimerTick),
    AttemptSubmitted(AttemptSubmitted),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimerTick {
    pub attempt_id: String,
    pub phase: Phase,
    pub part_seconds_left: u32,
    pub question_seconds_left: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AttemptSubmitted {
    pub attempt_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl TimerEvent {
    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            TimerEvent::TimerTick(_) => "timer-tick",
            TimerEvent::AttemptSubmitted(_) => "attempt-submitted",
        }
    }
}
