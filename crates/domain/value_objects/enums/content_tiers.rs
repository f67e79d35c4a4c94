use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Tier label attached to a premium content marker.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentTier {
    #[default]
    Basic,
    Pro,
    Enterprise,
}

impl ContentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentTier::Basic => "basic",
            ContentTier::Pro => "pro",
            ContentTier::Enterprise => "enterprise",
        }
    }
}

impl Display for ContentTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
