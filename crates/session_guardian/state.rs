use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct GuardianConfig {
    pub probe_interval: Duration,
    /// How long before token expiry the silent refresh runs.
    pub refresh_lead: Duration,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(30),
            refresh_lead: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthEndpoints {
    pub supabase_url: String,
    pub anon_key: String,
    pub backend_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(SignedInUser),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// User-facing reasons for a forced or voluntary sign-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    SessionExpired,
    LoggedInElsewhere,
    SignedOut,
}

impl SessionNotice {
    pub fn message(&self) -> &'static str {
        match self {
            SessionNotice::SessionExpired => "Your session has expired. Please sign in again.",
            SessionNotice::LoggedInElsewhere => {
                "You were signed out because your account was used to sign in on another device."
            }
            SessionNotice::SignedOut => "You have been signed out.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid,
    /// The registry reported another active session; local state was cleared.
    Invalidated,
    /// Another probe was already in flight.
    Skipped,
    NoSession,
    /// Transport failure; the session is left as it was.
    Failed,
}
