use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::recordings::{RecordingEntity, UpsertRecordingEntity};

#[async_trait]
#[automock]
pub trait RecordingRepository {
    /// Keyed by broadcast id; a second call for the same id updates in place.
    async fn upsert_by_broadcast_id(&self, entity: UpsertRecordingEntity) -> Result<Uuid>;

    async fn list_recent(&self, limit: i64) -> Result<Vec<RecordingEntity>>;
}
