use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::conversations::{
            ConversationTurnEntity, InsertAssistantMemoryEntity, InsertConversationTurnEntity,
        },
        repositories::conversations::ConversationRepository,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{ai_assistant_memory, ai_chat_messages},
    },
};

pub struct ConversationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ConversationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ConversationRepository for ConversationPostgres {
    async fn recent_turns(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ConversationTurnEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = ai_chat_messages::table
            .filter(ai_chat_messages::conversation_id.eq(conversation_id))
            .filter(ai_chat_messages::user_id.eq(user_id))
            .order(ai_chat_messages::created_at.desc())
            .limit(limit)
            .select(ConversationTurnEntity::as_select())
            .load::<ConversationTurnEntity>(&mut conn)?;

        Ok(results)
    }

    async fn insert_turn(&self, entity: InsertConversationTurnEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(ai_chat_messages::table)
            .values(&entity)
            .returning(ai_chat_messages::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(id)
    }

    async fn insert_memory(&self, entity: InsertAssistantMemoryEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(ai_assistant_memory::table)
            .values(&entity)
            .execute(&mut conn)?;

        Ok(())
    }
}
