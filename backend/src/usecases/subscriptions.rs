use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Duration, Utc};
use harita::domain::{
    entities::premium_content::PremiumContentEntity,
    policies::entitlement_overrides::EntitlementOverridePolicy,
    repositories::{
        premium_content::PremiumContentRepository, subscriptions::SubscriptionRepository,
    },
    value_objects::{
        entitlements::Identity,
        enums::{subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier},
        subscriptions::{MarkPremiumContentModel, SubscriptionDto},
    },
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::entitlements::EntitlementResolver;

pub const UPGRADE_VALIDITY_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("tier `{0}` cannot be purchased")]
    InvalidTier(SubscriptionTier),
    #[error("content type and id are required")]
    InvalidContent,
    #[error("no subscription found")]
    SubscriptionNotFound,
    #[error("enterprise access is required")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::InvalidTier(_) | SubscriptionError::InvalidContent => {
                StatusCode::BAD_REQUEST
            }
            SubscriptionError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            SubscriptionError::Forbidden => StatusCode::FORBIDDEN,
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

pub struct SubscriptionUseCase<S, C, P>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: PremiumContentRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    subscription_repo: Arc<S>,
    premium_content_repo: Arc<C>,
    resolver: Arc<EntitlementResolver<S, P>>,
}

impl<S, C, P> SubscriptionUseCase<S, C, P>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: PremiumContentRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        premium_content_repo: Arc<C>,
        resolver: Arc<EntitlementResolver<S, P>>,
    ) -> Self {
        Self {
            subscription_repo,
            premium_content_repo,
            resolver,
        }
    }

    pub async fn current_subscription(&self, user_id: Uuid) -> UseCaseResult<SubscriptionDto> {
        if let Some(entity) = self.subscription_repo.find_by_user_id(user_id).await? {
            return Ok(entity.into());
        }

        self.subscription_repo
            .ensure_default_subscription(user_id)
            .await?;
        self.subscription_repo
            .find_by_user_id(user_id)
            .await?
            .map(SubscriptionDto::from)
            .ok_or_else(|| anyhow!("subscription row missing after default insert").into())
    }

    /// Failures read as "no premium access".
    pub async fn premium_access(&self, user_id: Uuid) -> bool {
        match self.subscription_repo.user_has_premium_access(user_id).await {
            Ok(has_access) => has_access,
            Err(err) => {
                warn!(%user_id, error = ?err, "subscriptions: premium access check failed");
                false
            }
        }
    }

    pub async fn upgrade(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
    ) -> UseCaseResult<SubscriptionDto> {
        if !tier.is_paid() {
            return Err(SubscriptionError::InvalidTier(tier));
        }

        self.subscription_repo
            .ensure_default_subscription(user_id)
            .await?;

        let expires_at = Utc::now() + Duration::days(UPGRADE_VALIDITY_DAYS);
        let entity = self
            .subscription_repo
            .upgrade(user_id, tier, expires_at)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound)?;

        info!(%user_id, %tier, "subscriptions: upgraded");
        Ok(entity.into())
    }

    pub async fn cancel(&self, user_id: Uuid) -> UseCaseResult<SubscriptionDto> {
        let entity = self
            .subscription_repo
            .update_status(user_id, SubscriptionStatus::Cancelled)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound)?;

        info!(%user_id, "subscriptions: cancelled");
        Ok(entity.into())
    }

    /// Unmarked content is open; marked content needs premium access.
    pub async fn check_content_access(
        &self,
        user_id: Uuid,
        content_type: &str,
        content_id: &str,
    ) -> bool {
        match self.premium_content_repo.find(content_type, content_id).await {
            Ok(Some(marker)) if marker.is_premium => self.premium_access(user_id).await,
            Ok(_) => true,
            Err(err) => {
                warn!(
                    %user_id,
                    content_type,
                    content_id,
                    error = ?err,
                    "subscriptions: content access lookup failed"
                );
                false
            }
        }
    }

    pub async fn mark_content_premium(
        &self,
        admin: &Identity,
        model: MarkPremiumContentModel,
    ) -> UseCaseResult<()> {
        let content_type = model.content_type.trim();
        let content_id = model.content_id.trim();
        if content_type.is_empty() || content_id.is_empty() {
            return Err(SubscriptionError::InvalidContent);
        }

        if !self
            .resolver
            .has_access(SubscriptionTier::Enterprise, Some(admin))
            .await
        {
            return Err(SubscriptionError::Forbidden);
        }

        self.premium_content_repo
            .upsert(PremiumContentEntity {
                content_type: content_type.to_string(),
                content_id: content_id.to_string(),
                is_premium: true,
                premium_tier: model.tier.as_str().to_string(),
                created_by: Some(admin.user_id),
                updated_at: Utc::now(),
            })
            .await?;

        info!(
            admin_id = %admin.user_id,
            content_type,
            content_id,
            tier = %model.tier,
            "subscriptions: content marked premium"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harita::domain::{
        entities::subscriptions::SubscriptionEntity,
        policies::entitlement_overrides::StaticOverridePolicy,
        repositories::{
            premium_content::MockPremiumContentRepository,
            subscriptions::MockSubscriptionRepository,
        },
        value_objects::enums::content_tiers::ContentTier,
    };
    use mockall::predicate::eq;

    type TestUseCase = SubscriptionUseCase<
        MockSubscriptionRepository,
        MockPremiumContentRepository,
        StaticOverridePolicy,
    >;

    fn usecase(
        subscription_repo: MockSubscriptionRepository,
        premium_content_repo: MockPremiumContentRepository,
        policy: StaticOverridePolicy,
    ) -> TestUseCase {
        let subscription_repo = Arc::new(subscription_repo);
        let resolver = Arc::new(EntitlementResolver::new(
            Arc::clone(&subscription_repo),
            Arc::new(policy),
        ));
        SubscriptionUseCase::new(subscription_repo, Arc::new(premium_content_repo), resolver)
    }

    fn entity(user_id: Uuid, tier: &str, status: &str) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            subscription_tier: tier.to_string(),
            status: status.to_string(),
            started_at: now,
            expires_at: Some(now + Duration::days(UPGRADE_VALIDITY_DAYS)),
            created_at: now,
            updated_at: now,
        }
    }

    fn marker(is_premium: bool) -> PremiumContentEntity {
        PremiumContentEntity {
            content_type: "course".to_string(),
            content_id: "qgis-101".to_string(),
            is_premium,
            premium_tier: "pro".to_string(),
            created_by: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upgrade_rejects_free_tier() {
        let usecase = usecase(
            MockSubscriptionRepository::new(),
            MockPremiumContentRepository::new(),
            StaticOverridePolicy::empty(),
        );

        let err = usecase
            .upgrade(Uuid::new_v4(), SubscriptionTier::Free)
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidTier(SubscriptionTier::Free)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upgrade_sets_active_tier_for_a_year() {
        let user_id = Uuid::new_v4();
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_ensure_default_subscription()
            .with(eq(user_id))
            .returning(|_| Box::pin(async { Ok(()) }));
        repo.expect_upgrade()
            .withf(move |id, tier, expires_at| {
                *id == user_id
                    && *tier == SubscriptionTier::Pro
                    && *expires_at > Utc::now() + Duration::days(UPGRADE_VALIDITY_DAYS - 1)
            })
            .returning(move |id, _, _| {
                let row = entity(id, "pro", "active");
                Box::pin(async move { Ok(Some(row)) })
            });

        let usecase = usecase(
            repo,
            MockPremiumContentRepository::new(),
            StaticOverridePolicy::empty(),
        );
        let dto = usecase.upgrade(user_id, SubscriptionTier::Pro).await.unwrap();

        assert_eq!(dto.subscription_tier, SubscriptionTier::Pro);
        assert_eq!(dto.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn cancel_without_row_is_not_found() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_update_status()
            .returning(|_, _| Box::pin(async { Ok(None) }));

        let usecase = usecase(
            repo,
            MockPremiumContentRepository::new(),
            StaticOverridePolicy::empty(),
        );
        let err = usecase.cancel(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::SubscriptionNotFound));
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn premium_access_failure_reads_as_false() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_user_has_premium_access()
            .returning(|_| Box::pin(async { Err(anyhow!("function missing")) }));

        let usecase = usecase(
            repo,
            MockPremiumContentRepository::new(),
            StaticOverridePolicy::empty(),
        );
        assert!(!usecase.premium_access(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn unmarked_content_is_open_and_marked_content_needs_premium() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_user_has_premium_access()
            .times(1)
            .returning(|_| Box::pin(async { Ok(false) }));

        let mut content_repo = MockPremiumContentRepository::new();
        content_repo
            .expect_find()
            .withf(|content_type, content_id| {
                content_type.to_string() == "course" && content_id.to_string() == "intro"
            })
            .returning(|_, _| Box::pin(async { Ok(None) }));
        content_repo
            .expect_find()
            .withf(|_, content_id| content_id.to_string() == "qgis-101")
            .returning(|_, _| Box::pin(async { Ok(Some(marker(true))) }));

        let usecase = usecase(subscription_repo, content_repo, StaticOverridePolicy::empty());
        let user_id = Uuid::new_v4();

        assert!(usecase.check_content_access(user_id, "course", "intro").await);
        assert!(!usecase.check_content_access(user_id, "course", "qgis-101").await);
    }

    #[tokio::test]
    async fn content_lookup_failure_denies_access() {
        let mut content_repo = MockPremiumContentRepository::new();
        content_repo
            .expect_find()
            .returning(|_, _| Box::pin(async { Err(anyhow!("timeout")) }));

        let usecase = usecase(
            MockSubscriptionRepository::new(),
            content_repo,
            StaticOverridePolicy::empty(),
        );
        assert!(!usecase.check_content_access(Uuid::new_v4(), "course", "x").await);
    }

    #[tokio::test]
    async fn marking_content_requires_enterprise() {
        let admin = Identity::new(Uuid::new_v4(), Some("learner@example.com".to_string()));
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_subscription_safe()
            .returning(|_| {
                Box::pin(async {
                    Ok(Some(harita::domain::value_objects::subscriptions::SubscriptionSnapshot {
                        tier: SubscriptionTier::Pro,
                        status: SubscriptionStatus::Active,
                        expires_at: None,
                    }))
                })
            });

        let usecase = usecase(
            subscription_repo,
            MockPremiumContentRepository::new(),
            StaticOverridePolicy::empty(),
        );
        let err = usecase
            .mark_content_premium(
                &admin,
                MarkPremiumContentModel {
                    content_type: "course".to_string(),
                    content_id: "qgis-101".to_string(),
                    tier: ContentTier::Pro,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::Forbidden));
    }

    #[tokio::test]
    async fn super_admin_marks_content_premium() {
        let admin = Identity::new(Uuid::new_v4(), Some("owner@harita.io".to_string()));
        let admin_id = admin.user_id;
        let mut content_repo = MockPremiumContentRepository::new();
        content_repo
            .expect_upsert()
            .withf(move |entity| {
                entity.is_premium
                    && entity.premium_tier == "enterprise"
                    && entity.created_by == Some(admin_id)
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let policy = StaticOverridePolicy::new(
            Some("owner@harita.io"),
            Vec::<String>::new(),
            Duration::days(UPGRADE_VALIDITY_DAYS),
        );
        let usecase = usecase(MockSubscriptionRepository::new(), content_repo, policy);

        usecase
            .mark_content_premium(
                &admin,
                MarkPremiumContentModel {
                    content_type: "course".to_string(),
                    content_id: "geoai-lab".to_string(),
                    tier: ContentTier::Enterprise,
                },
            )
            .await
            .unwrap();
    }
}
