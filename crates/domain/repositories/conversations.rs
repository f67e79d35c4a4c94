use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::conversations::{
    ConversationTurnEntity, InsertAssistantMemoryEntity, InsertConversationTurnEntity,
};

#[async_trait]
#[automock]
pub trait ConversationRepository {
    /// Most recent turns first.
    async fn recent_turns(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ConversationTurnEntity>>;

    async fn insert_turn(&self, entity: InsertConversationTurnEntity) -> Result<Uuid>;

    async fn insert_memory(&self, entity: InsertAssistantMemoryEntity) -> Result<()>;
}
