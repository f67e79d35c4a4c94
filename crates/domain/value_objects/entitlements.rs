use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier,
};

/// An authenticated principal as seen by entitlement checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: Uuid, email: Option<String>) -> Self {
        Self { user_id, email }
    }

    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Where an entitlement came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementSource {
    Anonymous,
    SuperAdmin,
    Override,
    Subscription,
    /// The subscription lookup failed; only free access is granted.
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entitlement {
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub source: EntitlementSource,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "limit", rename_all = "snake_case")]
pub enum JobPostingLimit {
    Limited(u32),
    Unlimited,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrialFeature {
    Qgis,
    Dashboard,
}

pub const PRO_JOB_POSTING_LIMIT: u32 = 5;

impl Entitlement {
    pub fn anonymous() -> Self {
        Self::free(EntitlementSource::Anonymous)
    }

    pub fn degraded() -> Self {
        Self::free(EntitlementSource::Degraded)
    }

    fn free(source: EntitlementSource) -> Self {
        Self {
            tier: SubscriptionTier::Free,
            status: SubscriptionStatus::Active,
            expires_at: None,
            source,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active
            && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    pub fn has_access_at(&self, required: SubscriptionTier, now: DateTime<Utc>) -> bool {
        if required == SubscriptionTier::Free {
            return true;
        }
        match self.source {
            EntitlementSource::Anonymous => return false,
            // A matched override satisfies every requirement.
            EntitlementSource::SuperAdmin | EntitlementSource::Override => return true,
            EntitlementSource::Subscription | EntitlementSource::Degraded => {}
        }
        self.tier.rank() >= required.rank() && self.is_active_at(now)
    }

    pub fn has_access(&self, required: SubscriptionTier) -> bool {
        self.has_access_at(required, Utc::now())
    }

    pub fn job_posting_limit_at(&self, now: DateTime<Utc>) -> JobPostingLimit {
        if self.has_access_at(SubscriptionTier::Enterprise, now) {
            JobPostingLimit::Unlimited
        } else if self.has_access_at(SubscriptionTier::Pro, now) {
            JobPostingLimit::Limited(PRO_JOB_POSTING_LIMIT)
        } else {
            JobPostingLimit::Limited(0)
        }
    }

    /// Free-tier callers get a one-day trial of the listed features.
    pub fn has_trial_access_at(&self, _feature: TrialFeature, now: DateTime<Utc>) -> bool {
        !self.has_access_at(SubscriptionTier::Premium, now)
    }

    pub fn features_at(&self, now: DateTime<Utc>) -> FeatureFlags {
        let pro = self.has_access_at(SubscriptionTier::Pro, now);
        let enterprise = self.has_access_at(SubscriptionTier::Enterprise, now);
        FeatureFlags {
            learn_section: pro,
            geo_ai_lab: pro,
            webgis_builder: pro,
            geo_processing_lab: pro,
            plugin_marketplace: pro,
            qgis_integration: pro,
            post_jobs: pro,
            job_posting_limit: self.job_posting_limit_at(now),
            advanced_dashboard: enterprise,
            api_access: enterprise,
            qgis_trial: self.has_trial_access_at(TrialFeature::Qgis, now),
            dashboard_trial: self.has_trial_access_at(TrialFeature::Dashboard, now),
        }
    }

    pub fn features(&self) -> FeatureFlags {
        self.features_at(Utc::now())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeatureFlags {
    pub learn_section: bool,
    pub geo_ai_lab: bool,
    pub webgis_builder: bool,
    pub geo_processing_lab: bool,
    pub plugin_marketplace: bool,
    pub qgis_integration: bool,
    pub post_jobs: bool,
    pub job_posting_limit: JobPostingLimit,
    pub advanced_dashboard: bool,
    pub api_access: bool,
    pub qgis_trial: bool,
    pub dashboard_trial: bool,
}

#[derive(Debug, Serialize)]
pub struct EntitlementDto {
    #[serde(flatten)]
    pub entitlement: Entitlement,
    pub features: FeatureFlags,
}

impl From<Entitlement> for EntitlementDto {
    fn from(entitlement: Entitlement) -> Self {
        let features = entitlement.features();
        Self {
            entitlement,
            features,
        }
    }
}
