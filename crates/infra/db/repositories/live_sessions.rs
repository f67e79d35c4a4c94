use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    RunQueryDsl, insert_into,
    prelude::*,
    sql_query,
    sql_types::{Int4, Nullable, Text, Timestamptz, Uuid as SqlUuid},
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::live_sessions::{LiveSessionEntity, UpsertLiveSessionEntity},
        repositories::live_sessions::LiveSessionRepository,
        value_objects::enums::live_session_statuses::LiveSessionStatus,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::live_classes},
};

// The WHERE on the conflict branch keeps a started session from being
// rewritten as scheduled even when two syncs race.
const UPSERT_SCHEDULED_SQL: &str = r#"
INSERT INTO live_classes (
    stream_key, title, description, status, scheduled_start_time,
    viewer_count, thumbnail_url, youtube_url, embed_url, access_tier, updated_at
)
VALUES ($1, $2, $3, 'scheduled', $4, $5, $6, $7, $8, $9, $10)
ON CONFLICT (stream_key) DO UPDATE SET
    title = EXCLUDED.title,
    description = COALESCE(EXCLUDED.description, live_classes.description),
    scheduled_start_time = EXCLUDED.scheduled_start_time,
    thumbnail_url = COALESCE(EXCLUDED.thumbnail_url, live_classes.thumbnail_url),
    updated_at = EXCLUDED.updated_at
WHERE live_classes.status = 'scheduled'
RETURNING id
"#;

#[derive(QueryableByName)]
struct IdRow {
    #[diesel(sql_type = SqlUuid)]
    id: Uuid,
}

pub struct LiveSessionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LiveSessionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LiveSessionRepository for LiveSessionPostgres {
    async fn find_by_broadcast_id(&self, broadcast_id: &str) -> Result<Option<LiveSessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = live_classes::table
            .filter(live_classes::stream_key.eq(broadcast_id))
            .select(LiveSessionEntity::as_select())
            .first::<LiveSessionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn upsert(&self, entity: UpsertLiveSessionEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(live_classes::table)
            .values(&entity)
            .on_conflict(live_classes::stream_key)
            .do_update()
            .set(&entity)
            .returning(live_classes::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(id)
    }

    async fn upsert_scheduled(&self, entity: UpsertLiveSessionEntity) -> Result<Option<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = sql_query(UPSERT_SCHEDULED_SQL)
            .bind::<Text, _>(&entity.stream_key)
            .bind::<Text, _>(&entity.title)
            .bind::<Nullable<Text>, _>(&entity.description)
            .bind::<Nullable<Timestamptz>, _>(entity.scheduled_start_time)
            .bind::<Int4, _>(entity.viewer_count)
            .bind::<Nullable<Text>, _>(&entity.thumbnail_url)
            .bind::<Text, _>(&entity.youtube_url)
            .bind::<Text, _>(&entity.embed_url)
            .bind::<Text, _>(&entity.access_tier)
            .bind::<Timestamptz, _>(entity.updated_at)
            .get_result::<IdRow>(&mut conn)
            .optional()?;

        Ok(row.map(|row| row.id))
    }

    async fn list_live(&self) -> Result<Vec<LiveSessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = live_classes::table
            .filter(live_classes::status.eq(LiveSessionStatus::Live.as_str()))
            .select(LiveSessionEntity::as_select())
            .load::<LiveSessionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_without_recording(&self) -> Result<Vec<LiveSessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = live_classes::table
            .filter(live_classes::recording_id.is_null())
            .filter(live_classes::status.eq_any([
                LiveSessionStatus::Live.as_str(),
                LiveSessionStatus::Ended.as_str(),
            ]))
            .select(LiveSessionEntity::as_select())
            .load::<LiveSessionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_ended(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(live_classes::table)
            .filter(live_classes::id.eq(id))
            .set((
                live_classes::status.eq(LiveSessionStatus::Ended.as_str()),
                live_classes::end_time.eq(Some(ended_at)),
                live_classes::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn attach_recording(
        &self,
        id: Uuid,
        recording_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(live_classes::table)
            .filter(live_classes::id.eq(id))
            .set((
                live_classes::status.eq(LiveSessionStatus::Ended.as_str()),
                live_classes::recording_id.eq(Some(recording_id)),
                live_classes::end_time.eq(Some(ended_at)),
                live_classes::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<LiveSessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = live_classes::table
            .order(live_classes::updated_at.desc())
            .limit(limit)
            .select(LiveSessionEntity::as_select())
            .load::<LiveSessionEntity>(&mut conn)?;

        Ok(results)
    }
}
