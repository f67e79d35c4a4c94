use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update, upsert::excluded};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::user_sessions::UserSessionEntity,
        repositories::user_sessions::UserSessionRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::user_sessions},
};

pub struct UserSessionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserSessionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserSessionRepository for UserSessionPostgres {
    async fn replace_active_session(&self, entity: UserSessionEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(user_sessions::table)
            .values(&entity)
            .on_conflict(user_sessions::user_id)
            .do_update()
            .set((
                user_sessions::session_id.eq(excluded(user_sessions::session_id)),
                user_sessions::user_agent.eq(excluded(user_sessions::user_agent)),
                user_sessions::created_at.eq(excluded(user_sessions::created_at)),
                user_sessions::last_seen_at.eq(excluded(user_sessions::last_seen_at)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn touch_if_active(&self, user_id: Uuid, session_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(user_sessions::table)
            .filter(user_sessions::user_id.eq(user_id))
            .filter(user_sessions::session_id.eq(session_id))
            .set(user_sessions::last_seen_at.eq(Utc::now()))
            .execute(&mut conn)?;

        Ok(updated == 1)
    }

    async fn revoke(&self, user_id: Uuid, session_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(user_sessions::table)
            .filter(user_sessions::user_id.eq(user_id))
            .filter(user_sessions::session_id.eq(session_id))
            .execute(&mut conn)?;

        Ok(deleted > 0)
    }
}
