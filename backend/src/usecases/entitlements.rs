use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use harita::domain::{
    policies::entitlement_overrides::{EntitlementOverridePolicy, OverrideKind},
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        entitlements::{Entitlement, EntitlementSource, Identity},
        enums::{subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier},
        subscriptions::SubscriptionSnapshot,
    },
};
use tracing::{debug, error};
use uuid::Uuid;

/// Resolves the effective tier for a caller. Never fails: a broken lookup
/// yields a degraded free entitlement.
pub struct EntitlementResolver<S, P>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    subscription_repo: Arc<S>,
    override_policy: Arc<P>,
}

impl<S, P> EntitlementResolver<S, P>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    pub fn new(subscription_repo: Arc<S>, override_policy: Arc<P>) -> Self {
        Self {
            subscription_repo,
            override_policy,
        }
    }

    pub async fn resolve(&self, identity: Option<&Identity>) -> Entitlement {
        match identity {
            Some(identity) => self.resolve_at(identity, Utc::now()).await,
            None => Entitlement::anonymous(),
        }
    }

    pub async fn resolve_at(&self, identity: &Identity, now: DateTime<Utc>) -> Entitlement {
        // Overrides are checked before any read.
        if let Some(grant) = self.override_policy.override_for(identity) {
            debug!(
                user_id = %identity.user_id,
                kind = ?grant.kind,
                tier = %grant.tier,
                "entitlements: override applied"
            );
            return Entitlement {
                tier: grant.tier,
                status: SubscriptionStatus::Active,
                expires_at: grant.valid_for.map(|validity| now + validity),
                source: match grant.kind {
                    OverrideKind::SuperAdmin => EntitlementSource::SuperAdmin,
                    OverrideKind::Grandfathered => EntitlementSource::Override,
                },
            };
        }

        match self.load_subscription(identity.user_id).await {
            Ok(snapshot) => Entitlement {
                tier: snapshot.tier,
                status: snapshot.status,
                expires_at: snapshot.expires_at,
                source: EntitlementSource::Subscription,
            },
            Err(err) => {
                error!(
                    user_id = %identity.user_id,
                    error = ?err,
                    "entitlements: subscription lookup failed; serving degraded free entitlement"
                );
                Entitlement::degraded()
            }
        }
    }

    pub async fn has_access(&self, required: SubscriptionTier, identity: Option<&Identity>) -> bool {
        if required == SubscriptionTier::Free {
            return true;
        }
        self.resolve(identity).await.has_access(required)
    }

    async fn load_subscription(&self, user_id: Uuid) -> Result<SubscriptionSnapshot> {
        if let Some(snapshot) = self.subscription_repo.find_subscription_safe(user_id).await? {
            return Ok(snapshot);
        }

        debug!(%user_id, "entitlements: no subscription row; creating free default");
        self.subscription_repo
            .ensure_default_subscription(user_id)
            .await?;

        let snapshot = self
            .subscription_repo
            .find_subscription_safe(user_id)
            .await?
            .unwrap_or(SubscriptionSnapshot {
                tier: SubscriptionTier::Free,
                status: SubscriptionStatus::Active,
                expires_at: None,
            });
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use harita::domain::{
        policies::entitlement_overrides::{DEFAULT_GRANDFATHERED_DAYS, StaticOverridePolicy},
        repositories::subscriptions::MockSubscriptionRepository,
    };
    use mockall::predicate::eq;

    fn identity(email: &str) -> Identity {
        Identity::new(Uuid::new_v4(), Some(email.to_string()))
    }

    fn policy() -> StaticOverridePolicy {
        StaticOverridePolicy::new(
            Some("owner@harita.io"),
            ["mapper@example.com"],
            Duration::days(DEFAULT_GRANDFATHERED_DAYS),
        )
    }

    fn resolver(repo: MockSubscriptionRepository) -> EntitlementResolver<MockSubscriptionRepository, StaticOverridePolicy> {
        EntitlementResolver::new(Arc::new(repo), Arc::new(policy()))
    }

    fn stored(
        repo: &mut MockSubscriptionRepository,
        user_id: Uuid,
        tier: SubscriptionTier,
        status: SubscriptionStatus,
        expires_at: Option<DateTime<Utc>>,
    ) {
        repo.expect_find_subscription_safe()
            .with(eq(user_id))
            .returning(move |_| {
                Box::pin(async move {
                    Ok(Some(SubscriptionSnapshot {
                        tier,
                        status,
                        expires_at,
                    }))
                })
            });
    }

    #[tokio::test]
    async fn override_grants_pro_without_reading_subscription() {
        // No expectations: any repository call panics.
        let repo = MockSubscriptionRepository::new();
        let resolver = resolver(repo);
        let caller = identity("  Mapper@Example.com");
        let now = Utc::now();

        let entitlement = resolver.resolve_at(&caller, now).await;

        assert_eq!(entitlement.tier, SubscriptionTier::Pro);
        assert_eq!(entitlement.status, SubscriptionStatus::Active);
        assert_eq!(entitlement.source, EntitlementSource::Override);
        assert_eq!(
            entitlement.expires_at,
            Some(now + Duration::days(DEFAULT_GRANDFATHERED_DAYS))
        );
        assert!(resolver.has_access(SubscriptionTier::Pro, Some(&caller)).await);
        assert!(resolver.has_access(SubscriptionTier::Enterprise, Some(&caller)).await);
    }

    #[tokio::test]
    async fn super_admin_is_enterprise_forever() {
        let resolver = resolver(MockSubscriptionRepository::new());
        let entitlement = resolver.resolve(Some(&identity("OWNER@harita.io"))).await;

        assert_eq!(entitlement.tier, SubscriptionTier::Enterprise);
        assert_eq!(entitlement.expires_at, None);
        assert_eq!(entitlement.source, EntitlementSource::SuperAdmin);
        assert!(entitlement.has_access(SubscriptionTier::Enterprise));
    }

    #[tokio::test]
    async fn free_is_granted_to_everyone_without_lookups() {
        let resolver = resolver(MockSubscriptionRepository::new());

        assert!(resolver.has_access(SubscriptionTier::Free, None).await);
        assert!(
            resolver
                .has_access(SubscriptionTier::Free, Some(&identity("someone@example.com")))
                .await
        );
    }

    #[tokio::test]
    async fn anonymous_caller_only_gets_free() {
        let resolver = resolver(MockSubscriptionRepository::new());

        let entitlement = resolver.resolve(None).await;

        assert_eq!(entitlement.source, EntitlementSource::Anonymous);
        assert!(!resolver.has_access(SubscriptionTier::Premium, None).await);
    }

    #[tokio::test]
    async fn active_pro_without_expiry_grants_pro_but_not_enterprise() {
        let caller = identity("learner@example.com");
        let mut repo = MockSubscriptionRepository::new();
        stored(&mut repo, caller.user_id, SubscriptionTier::Pro, SubscriptionStatus::Active, None);
        let resolver = resolver(repo);

        assert!(resolver.has_access(SubscriptionTier::Premium, Some(&caller)).await);
        assert!(resolver.has_access(SubscriptionTier::Pro, Some(&caller)).await);
        assert!(!resolver.has_access(SubscriptionTier::Enterprise, Some(&caller)).await);
    }

    #[tokio::test]
    async fn cancelled_enterprise_only_gets_free() {
        let caller = identity("learner@example.com");
        let mut repo = MockSubscriptionRepository::new();
        stored(
            &mut repo,
            caller.user_id,
            SubscriptionTier::Enterprise,
            SubscriptionStatus::Cancelled,
            None,
        );
        let resolver = resolver(repo);

        assert!(resolver.has_access(SubscriptionTier::Free, Some(&caller)).await);
        assert!(!resolver.has_access(SubscriptionTier::Premium, Some(&caller)).await);
    }

    #[tokio::test]
    async fn active_but_past_expiry_grants_nothing_paid() {
        let caller = identity("learner@example.com");
        let mut repo = MockSubscriptionRepository::new();
        stored(
            &mut repo,
            caller.user_id,
            SubscriptionTier::Enterprise,
            SubscriptionStatus::Active,
            Some(Utc::now() - Duration::minutes(1)),
        );
        let resolver = resolver(repo);

        for tier in [SubscriptionTier::Premium, SubscriptionTier::Pro, SubscriptionTier::Enterprise] {
            assert!(!resolver.has_access(tier, Some(&caller)).await);
        }
    }

    #[tokio::test]
    async fn missing_row_creates_free_default_once() {
        let caller = identity("new@example.com");
        let mut repo = MockSubscriptionRepository::new();
        let mut seq = mockall::Sequence::new();

        repo.expect_find_subscription_safe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async { Ok(None) }));
        repo.expect_ensure_default_subscription()
            .with(eq(caller.user_id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async { Ok(()) }));
        repo.expect_find_subscription_safe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Box::pin(async {
                    Ok(Some(SubscriptionSnapshot {
                        tier: SubscriptionTier::Free,
                        status: SubscriptionStatus::Active,
                        expires_at: None,
                    }))
                })
            });

        let entitlement = resolver(repo).resolve(Some(&caller)).await;

        assert_eq!(entitlement.tier, SubscriptionTier::Free);
        assert_eq!(entitlement.source, EntitlementSource::Subscription);
    }

    #[tokio::test]
    async fn lookup_failure_degrades_to_free() {
        let caller = identity("learner@example.com");
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_find_subscription_safe()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection refused")) }));
        let resolver = resolver(repo);

        let entitlement = resolver.resolve(Some(&caller)).await;

        assert_eq!(entitlement.source, EntitlementSource::Degraded);
        assert!(entitlement.has_access(SubscriptionTier::Free));
        assert!(!entitlement.has_access(SubscriptionTier::Premium));
    }

    #[tokio::test]
    async fn access_is_monotonic_in_required_tier() {
        for stored_tier in SubscriptionTier::ALL {
            let caller = identity("learner@example.com");
            let mut repo = MockSubscriptionRepository::new();
            stored(&mut repo, caller.user_id, stored_tier, SubscriptionStatus::Active, None);
            let resolver = resolver(repo);

            let mut previous = true;
            for required in SubscriptionTier::ALL {
                let allowed = resolver.has_access(required, Some(&caller)).await;
                assert!(previous || !allowed, "{stored_tier} allowed {required} after a lower tier was denied");
                previous = allowed;
            }
        }
    }
}
