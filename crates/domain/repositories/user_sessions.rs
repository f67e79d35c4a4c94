use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::user_sessions::UserSessionEntity;

#[async_trait]
#[automock]
pub trait UserSessionRepository {
    /// Replaces whatever session the user had; the new marker is the only valid one.
    async fn replace_active_session(&self, entity: UserSessionEntity) -> Result<()>;

    /// True and `last_seen_at` bumped when `session_id` is the user's active session.
    async fn touch_if_active(&self, user_id: Uuid, session_id: Uuid) -> Result<bool>;

    async fn revoke(&self, user_id: Uuid, session_id: Uuid) -> Result<bool>;
}
