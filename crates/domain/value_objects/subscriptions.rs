use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::subscriptions::{SubscriptionEntity, SubscriptionSafeRow};
use crate::domain::value_objects::enums::{
    content_tiers::ContentTier, subscription_statuses::SubscriptionStatus,
    subscription_tiers::SubscriptionTier,
};

/// Minimal subscription view used by the entitlement resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSnapshot {
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionSafeRow> for SubscriptionSnapshot {
    fn from(value: SubscriptionSafeRow) -> Self {
        Self {
            tier: SubscriptionTier::from_str(&value.tier),
            status: SubscriptionStatus::from_str(&value.status),
            expires_at: value.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            subscription_tier: SubscriptionTier::from_str(&value.subscription_tier),
            status: SubscriptionStatus::from_str(&value.status),
            started_at: value.started_at,
            expires_at: value.expires_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeSubscriptionModel {
    pub tier: SubscriptionTier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentAccessQuery {
    pub content_type: String,
    pub content_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkPremiumContentModel {
    pub content_type: String,
    pub content_id: String,
    #[serde(default)]
    pub tier: ContentTier,
}

#[derive(Debug, Serialize)]
pub struct AccessDto {
    pub allowed: bool,
}
