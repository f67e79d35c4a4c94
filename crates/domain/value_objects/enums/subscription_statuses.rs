use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Cancelled,
    Expired,
    Trial,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Trial => "trial",
        };
        write!(f, "{}", status)
    }
}

impl SubscriptionStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => SubscriptionStatus::Active,
            "cancelled" | "canceled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            "trial" => SubscriptionStatus::Trial,
            _ => SubscriptionStatus::Expired,
        }
    }
}
