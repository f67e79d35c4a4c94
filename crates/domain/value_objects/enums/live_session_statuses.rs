use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// scheduled -> live -> ended. `ended` is terminal.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LiveSessionStatus {
    #[default]
    Scheduled,
    Live,
    Ended,
}

impl LiveSessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveSessionStatus::Scheduled => "scheduled",
            LiveSessionStatus::Live => "live",
            LiveSessionStatus::Ended => "ended",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "live" => LiveSessionStatus::Live,
            "ended" | "completed" => LiveSessionStatus::Ended,
            _ => LiveSessionStatus::Scheduled,
        }
    }

    /// Whether the platform has already been seen broadcasting this session.
    pub fn has_started(&self) -> bool {
        matches!(self, LiveSessionStatus::Live | LiveSessionStatus::Ended)
    }
}

impl Display for LiveSessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
