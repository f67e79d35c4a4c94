use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;
use crate::domain::value_objects::{
    enums::{subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier},
    subscriptions::SubscriptionSnapshot,
};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    /// Calls `get_user_subscription_safe(user_id)`; at most one row.
    async fn find_subscription_safe(&self, user_id: Uuid) -> Result<Option<SubscriptionSnapshot>>;

    /// Inserts the default free/active row unless one already exists.
    async fn ensure_default_subscription(&self, user_id: Uuid) -> Result<()>;

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    /// Calls `user_has_premium_access(user_id)`.
    async fn user_has_premium_access(&self, user_id: Uuid) -> Result<bool>;

    async fn upgrade(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn update_status(
        &self,
        user_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Option<SubscriptionEntity>>;
}
