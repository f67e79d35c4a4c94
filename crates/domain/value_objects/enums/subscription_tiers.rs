use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Ordered entitlement level. Declaration order is the rank order.
#[derive(
    Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 4] = [
        SubscriptionTier::Free,
        SubscriptionTier::Premium,
        SubscriptionTier::Pro,
        SubscriptionTier::Enterprise,
    ];

    pub fn rank(&self) -> u8 {
        match self {
            SubscriptionTier::Free => 0,
            SubscriptionTier::Premium => 1,
            SubscriptionTier::Pro => 2,
            SubscriptionTier::Enterprise => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(SubscriptionTier::Free),
            "premium" => Some(SubscriptionTier::Premium),
            "pro" => Some(SubscriptionTier::Pro),
            "enterprise" => Some(SubscriptionTier::Enterprise),
            _ => None,
        }
    }

    /// Lenient decoding for stored rows; anything unrecognised grants nothing.
    pub fn from_str(value: &str) -> Self {
        Self::parse(value).unwrap_or(SubscriptionTier::Free)
    }

    pub fn is_paid(&self) -> bool {
        *self != SubscriptionTier::Free
    }
}

impl Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_matches_declaration_order() {
        let ranks: Vec<u8> = SubscriptionTier::ALL.iter().map(|t| t.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
        assert!(SubscriptionTier::Premium < SubscriptionTier::Pro);
    }

    #[test]
    fn unknown_tier_decodes_to_free() {
        assert_eq!(SubscriptionTier::from_str("platinum"), SubscriptionTier::Free);
        assert_eq!(SubscriptionTier::from_str(" PRO "), SubscriptionTier::Pro);
    }
}
