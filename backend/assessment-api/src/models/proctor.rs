use serde::{Deserialize, Serialize};

/// Observational counters accumulated during an attempt. Flags never block
/// submission and never alter scoring; they are forwarded into the final
/// result for downstream review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProctorFlags {
    pub focus_changes: u32,
    pub paste_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    FocusLost,
    Paste,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::FocusLost => "focus_lost",
            FlagKind::Paste => "paste",
        }
    }
}
