use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::recordings::{RecordingEntity, UpsertRecordingEntity},
        repositories::recordings::RecordingRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::class_recordings},
};

pub struct RecordingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl RecordingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl RecordingRepository for RecordingPostgres {
    async fn upsert_by_broadcast_id(&self, entity: UpsertRecordingEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(class_recordings::table)
            .values(&entity)
            .on_conflict(class_recordings::stream_key)
            .do_update()
            .set(&entity)
            .returning(class_recordings::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(id)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<RecordingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = class_recordings::table
            .order(class_recordings::created_at.desc())
            .limit(limit)
            .select(RecordingEntity::as_select())
            .load::<RecordingEntity>(&mut conn)?;

        Ok(results)
    }
}
