use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::live_classes;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = live_classes)]
pub struct LiveSessionEntity {
    pub id: Uuid,
    pub stream_key: String, // youtube broadcast / video id
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub viewer_count: i32,
    pub thumbnail_url: Option<String>,
    pub youtube_url: String,
    pub embed_url: String,
    pub access_tier: String,
    pub recording_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = live_classes)]
pub struct UpsertLiveSessionEntity {
    pub stream_key: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub viewer_count: i32,
    pub thumbnail_url: Option<String>,
    pub youtube_url: String,
    pub embed_url: String,
    pub access_tier: String,
    pub updated_at: DateTime<Utc>,
}
