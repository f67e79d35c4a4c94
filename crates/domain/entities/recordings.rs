use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::class_recordings;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = class_recordings)]
pub struct RecordingEntity {
    pub id: Uuid,
    pub stream_key: String,
    pub live_class_id: Option<Uuid>,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = class_recordings)]
pub struct UpsertRecordingEntity {
    pub stream_key: String,
    pub live_class_id: Option<Uuid>,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
