use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::assistant::{ContentMatch, ContentSource, UserContext};

#[async_trait]
#[automock]
pub trait AssistantContextRepository {
    async fn load_user_context(&self, user_id: Uuid) -> Result<UserContext>;

    /// Case-insensitive keyword search over one content table.
    async fn search(
        &self,
        source: ContentSource,
        keywords: Vec<String>,
        limit: i64,
    ) -> Result<Vec<ContentMatch>>;
}
