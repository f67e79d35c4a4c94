use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{ai_assistant_memory, ai_chat_messages};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = ai_chat_messages)]
pub struct ConversationTurnEntity {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub context_type: Option<String>,
    pub user_message: String,
    pub assistant_response: String,
    pub context_snippets: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ai_chat_messages)]
pub struct InsertConversationTurnEntity {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub context_type: Option<String>,
    pub user_message: String,
    pub assistant_response: String,
    pub context_snippets: serde_json::Value,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ai_assistant_memory)]
pub struct InsertAssistantMemoryEntity {
    pub user_id: Uuid,
    pub conversation_id: Uuid,
    pub topics: Vec<String>,
    pub intent: String,
}
