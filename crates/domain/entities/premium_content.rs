use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::premium_content;

#[derive(Debug, Clone, Selectable, Queryable, Insertable)]
#[diesel(table_name = premium_content)]
pub struct PremiumContentEntity {
    pub content_type: String,
    pub content_id: String,
    pub is_premium: bool,
    pub premium_tier: String,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}
