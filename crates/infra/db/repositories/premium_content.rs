use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*, upsert::excluded};
use std::sync::Arc;

use crate::{
    domain::{
        entities::premium_content::PremiumContentEntity,
        repositories::premium_content::PremiumContentRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::premium_content},
};

pub struct PremiumContentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PremiumContentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PremiumContentRepository for PremiumContentPostgres {
    async fn find(
        &self,
        content_type: &str,
        content_id: &str,
    ) -> Result<Option<PremiumContentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = premium_content::table
            .filter(premium_content::content_type.eq(content_type))
            .filter(premium_content::content_id.eq(content_id))
            .select(PremiumContentEntity::as_select())
            .first::<PremiumContentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn upsert(&self, entity: PremiumContentEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(premium_content::table)
            .values(&entity)
            .on_conflict((premium_content::content_type, premium_content::content_id))
            .do_update()
            .set((
                premium_content::is_premium.eq(excluded(premium_content::is_premium)),
                premium_content::premium_tier.eq(excluded(premium_content::premium_tier)),
                premium_content::created_by.eq(excluded(premium_content::created_by)),
                premium_content::updated_at.eq(excluded(premium_content::updated_at)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
