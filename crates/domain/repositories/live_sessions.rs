use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::live_sessions::{LiveSessionEntity, UpsertLiveSessionEntity};

#[async_trait]
#[automock]
pub trait LiveSessionRepository {
    async fn find_by_broadcast_id(&self, broadcast_id: &str) -> Result<Option<LiveSessionEntity>>;

    /// Insert or overwrite keyed by broadcast id.
    async fn upsert(&self, entity: UpsertLiveSessionEntity) -> Result<Uuid>;

    /// Insert, or update only while the stored row is still `scheduled`.
    /// Returns `None` when a started session blocked the write.
    async fn upsert_scheduled(&self, entity: UpsertLiveSessionEntity) -> Result<Option<Uuid>>;

    async fn list_live(&self) -> Result<Vec<LiveSessionEntity>>;

    /// `live` or `ended` sessions that have no recording yet.
    async fn list_without_recording(&self) -> Result<Vec<LiveSessionEntity>>;

    async fn mark_ended(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<()>;

    async fn attach_recording(
        &self,
        id: Uuid,
        recording_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn list_recent(&self, limit: i64) -> Result<Vec<LiveSessionEntity>>;
}
