use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::premium_content::PremiumContentEntity;

#[async_trait]
#[automock]
pub trait PremiumContentRepository {
    async fn find(
        &self,
        content_type: &str,
        content_id: &str,
    ) -> Result<Option<PremiumContentEntity>>;

    async fn upsert(&self, entity: PremiumContentEntity) -> Result<()>;
}
