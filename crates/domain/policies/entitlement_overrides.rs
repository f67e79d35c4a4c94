use std::collections::HashSet;

use chrono::Duration;

use crate::domain::value_objects::{
    entitlements::{Identity, normalize_email},
    enums::subscription_tiers::SubscriptionTier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    SuperAdmin,
    Grandfathered,
}

/// A tier granted without consulting the subscription store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideGrant {
    pub kind: OverrideKind,
    pub tier: SubscriptionTier,
    /// `None` means the grant never expires.
    pub valid_for: Option<Duration>,
}

#[cfg_attr(test, mockall::automock)]
pub trait EntitlementOverridePolicy: Send + Sync {
    fn override_for(&self, identity: &Identity) -> Option<OverrideGrant>;
}

/// Allow-list backed policy: one super-admin plus grandfathered accounts.
#[derive(Debug, Clone)]
pub struct StaticOverridePolicy {
    super_admin_email: Option<String>,
    grandfathered: HashSet<String>,
    grandfathered_tier: SubscriptionTier,
    grandfathered_validity: Duration,
}

pub const DEFAULT_GRANDFATHERED_DAYS: i64 = 365;

impl StaticOverridePolicy {
    pub fn new<I, S>(super_admin_email: Option<&str>, grandfathered: I, validity: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            super_admin_email: super_admin_email
                .map(normalize_email)
                .filter(|email| !email.is_empty()),
            grandfathered: grandfathered
                .into_iter()
                .map(|email| normalize_email(email.as_ref()))
                .filter(|email| !email.is_empty())
                .collect(),
            grandfathered_tier: SubscriptionTier::Pro,
            grandfathered_validity: validity,
        }
    }

    pub fn empty() -> Self {
        Self::new(
            None,
            Vec::<String>::new(),
            Duration::days(DEFAULT_GRANDFATHERED_DAYS),
        )
    }

    pub fn grandfathered_count(&self) -> usize {
        self.grandfathered.len()
    }
}

impl EntitlementOverridePolicy for StaticOverridePolicy {
    fn override_for(&self, identity: &Identity) -> Option<OverrideGrant> {
        let email = identity.normalized_email()?;

        if self.super_admin_email.as_deref() == Some(email.as_str()) {
            return Some(OverrideGrant {
                kind: OverrideKind::SuperAdmin,
                tier: SubscriptionTier::Enterprise,
                valid_for: None,
            });
        }

        if self.grandfathered.contains(&email) {
            return Some(OverrideGrant {
                kind: OverrideKind::Grandfathered,
                tier: self.grandfathered_tier,
                valid_for: Some(self.grandfathered_validity),
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(email: &str) -> Identity {
        Identity::new(Uuid::new_v4(), Some(email.to_string()))
    }

    fn policy() -> StaticOverridePolicy {
        StaticOverridePolicy::new(
            Some("Owner@Harita.io"),
            ["Mapper@Example.com ", "analyst@example.com"],
            Duration::days(DEFAULT_GRANDFATHERED_DAYS),
        )
    }

    #[test]
    fn super_admin_matches_case_insensitively() {
        let grant = policy().override_for(&identity("owner@harita.IO")).unwrap();
        assert_eq!(grant.kind, OverrideKind::SuperAdmin);
        assert_eq!(grant.tier, SubscriptionTier::Enterprise);
        assert_eq!(grant.valid_for, None);
    }

    #[test]
    fn grandfathered_accounts_get_pro_for_a_year() {
        let grant = policy().override_for(&identity("MAPPER@example.com")).unwrap();
        assert_eq!(grant.kind, OverrideKind::Grandfathered);
        assert_eq!(grant.tier, SubscriptionTier::Pro);
        assert_eq!(grant.valid_for, Some(Duration::days(365)));
    }

    #[test]
    fn unknown_or_missing_email_has_no_grant() {
        assert!(policy().override_for(&identity("nobody@example.com")).is_none());
        let no_email = Identity::new(Uuid::new_v4(), None);
        assert!(policy().override_for(&no_email).is_none());
        assert!(StaticOverridePolicy::empty()
            .override_for(&identity("owner@harita.io"))
            .is_none());
    }
}
