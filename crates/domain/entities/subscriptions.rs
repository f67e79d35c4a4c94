use chrono::{DateTime, Utc};
use diesel::{
    prelude::*,
    sql_types::{Nullable, Text, Timestamptz},
};
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_subscriptions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = user_subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_tier: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub subscription_tier: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_subscriptions)]
pub struct SubscriptionChangeset {
    pub subscription_tier: Option<String>,
    pub status: String,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape returned by the `get_user_subscription_safe(user_id)` function.
#[derive(Debug, Clone, QueryableByName)]
pub struct SubscriptionSafeRow {
    #[diesel(sql_type = Text)]
    pub tier: String,
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub expires_at: Option<DateTime<Utc>>,
}
