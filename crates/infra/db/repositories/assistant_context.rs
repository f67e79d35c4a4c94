use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::SubscriptionEntity,
        repositories::assistant_context::AssistantContextRepository,
        value_objects::{
            assistant::{ContentMatch, ContentSource, UserContext},
            enums::{
                subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier,
            },
        },
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{
            code_snippets, course_enrollments, courses, gis_tools, profiles, project_templates,
            user_subscriptions,
        },
    },
};

const ENROLLMENT_LIMIT: i64 = 10;

type MatchRow = (Uuid, String, Option<String>);

pub struct AssistantContextPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AssistantContextPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AssistantContextRepository for AssistantContextPostgres {
    async fn load_user_context(&self, user_id: Uuid) -> Result<UserContext> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let profile = profiles::table
            .filter(profiles::id.eq(user_id))
            .select((
                profiles::full_name,
                profiles::professional_title,
                profiles::experience_level,
            ))
            .first::<(Option<String>, Option<String>, Option<String>)>(&mut conn)
            .optional()?;

        let subscription = user_subscriptions::table
            .filter(user_subscriptions::user_id.eq(user_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        let enrolled_courses = course_enrollments::table
            .inner_join(courses::table)
            .filter(course_enrollments::user_id.eq(user_id))
            .order(course_enrollments::enrolled_at.desc())
            .limit(ENROLLMENT_LIMIT)
            .select(courses::title)
            .load::<String>(&mut conn)?;

        let (display_name, professional_title, experience_level) =
            profile.unwrap_or((None, None, None));

        Ok(UserContext {
            display_name,
            professional_title,
            experience_level,
            tier: subscription
                .as_ref()
                .map(|s| SubscriptionTier::from_str(&s.subscription_tier))
                .unwrap_or_default(),
            status: subscription
                .as_ref()
                .map(|s| SubscriptionStatus::from_str(&s.status))
                .unwrap_or_default(),
            enrolled_courses,
        })
    }

    async fn search(
        &self,
        source: ContentSource,
        keywords: Vec<String>,
        limit: i64,
    ) -> Result<Vec<ContentMatch>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;
        let patterns: Vec<String> = keywords.iter().map(|k| format!("%{k}%")).collect();

        let rows: Vec<MatchRow> = match source {
            ContentSource::CodeSnippet => {
                let mut query = code_snippets::table
                    .select((
                        code_snippets::id,
                        code_snippets::title,
                        code_snippets::description,
                    ))
                    .into_boxed();
                for pattern in &patterns {
                    query = query.or_filter(code_snippets::title.ilike(pattern.clone()));
                }
                query.limit(limit).load::<MatchRow>(&mut conn)?
            }
            ContentSource::Template => {
                let mut query = project_templates::table
                    .select((
                        project_templates::id,
                        project_templates::title,
                        project_templates::description,
                    ))
                    .into_boxed();
                for pattern in &patterns {
                    query = query.or_filter(project_templates::title.ilike(pattern.clone()));
                }
                query.limit(limit).load::<MatchRow>(&mut conn)?
            }
            ContentSource::Tool => {
                let mut query = gis_tools::table
                    .select((gis_tools::id, gis_tools::name, gis_tools::description))
                    .into_boxed();
                for pattern in &patterns {
                    query = query.or_filter(gis_tools::name.ilike(pattern.clone()));
                }
                query.limit(limit).load::<MatchRow>(&mut conn)?
            }
        };

        Ok(rows
            .into_iter()
            .map(|(id, title, summary)| ContentMatch::new(source, id, title, summary))
            .collect())
    }
}
