use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_sessions;

/// The single active session marker for a user.
#[derive(Debug, Clone, Selectable, Queryable, Insertable)]
#[diesel(table_name = user_sessions)]
pub struct UserSessionEntity {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}
