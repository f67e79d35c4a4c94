use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    RunQueryDsl, insert_into,
    prelude::*,
    sql_query,
    sql_types::{Bool, Uuid as SqlUuid},
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::{
            InsertSubscriptionEntity, SubscriptionChangeset, SubscriptionEntity,
            SubscriptionSafeRow,
        },
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            enums::{
                subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier,
            },
            subscriptions::SubscriptionSnapshot,
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::user_subscriptions},
};

/// The function returns the full row; its tier column is `subscription_tier`.
const SUBSCRIPTION_SAFE_SQL: &str =
    "SELECT subscription_tier AS tier, status, expires_at FROM get_user_subscription_safe($1)";

#[derive(QueryableByName)]
struct PremiumAccessRow {
    #[diesel(sql_type = Bool)]
    has_access: bool,
}

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_subscription_safe(&self, user_id: Uuid) -> Result<Option<SubscriptionSnapshot>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = sql_query(SUBSCRIPTION_SAFE_SQL)
            .bind::<SqlUuid, _>(user_id)
            .get_result::<SubscriptionSafeRow>(&mut conn)
            .optional()?;

        Ok(row.map(SubscriptionSnapshot::from))
    }

    async fn ensure_default_subscription(&self, user_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(user_subscriptions::table)
            .values(&InsertSubscriptionEntity {
                user_id,
                subscription_tier: SubscriptionTier::Free.to_string(),
                status: SubscriptionStatus::Active.to_string(),
                started_at: Utc::now(),
                expires_at: None,
            })
            .on_conflict(user_subscriptions::user_id)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = user_subscriptions::table
            .filter(user_subscriptions::user_id.eq(user_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn user_has_premium_access(&self, user_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = sql_query("SELECT COALESCE(user_has_premium_access($1), false) AS has_access")
            .bind::<SqlUuid, _>(user_id)
            .get_result::<PremiumAccessRow>(&mut conn)?;

        Ok(row.has_access)
    }

    async fn upgrade(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(user_subscriptions::table)
            .filter(user_subscriptions::user_id.eq(user_id))
            .set(&SubscriptionChangeset {
                subscription_tier: Some(tier.to_string()),
                status: SubscriptionStatus::Active.to_string(),
                expires_at: Some(Some(expires_at)),
                updated_at: Utc::now(),
            })
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_status(
        &self,
        user_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(user_subscriptions::table)
            .filter(user_subscriptions::user_id.eq(user_id))
            .set(&SubscriptionChangeset {
                subscription_tier: None,
                status: status.to_string(),
                expires_at: None,
                updated_at: Utc::now(),
            })
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::{debug_query, pg::Pg};

    #[test]
    fn subscription_safe_query_reads_the_function_tier_column() {
        let query = sql_query(SUBSCRIPTION_SAFE_SQL).bind::<SqlUuid, _>(Uuid::nil());
        let rendered = debug_query::<Pg, _>(&query).to_string();

        assert!(rendered.contains("subscription_tier AS tier"));
        assert!(!rendered.starts_with("SELECT tier"));
        assert!(rendered.contains("get_user_subscription_safe($1)"));
    }
}
