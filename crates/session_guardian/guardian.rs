use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use chrono::Utc;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::{
    auth_gateway::AuthGateway,
    state::{AuthTokens, GuardianConfig, ProbeOutcome, SessionNotice, SessionState, SignedInUser},
};

const NOTICE_CAPACITY: usize = 16;

struct ActiveSession {
    tokens: AuthTokens,
    session_id: String,
}

struct Shared<G> {
    gateway: G,
    config: GuardianConfig,
    user_agent: Option<String>,
    state_tx: watch::Sender<SessionState>,
    notices: broadcast::Sender<SessionNotice>,
    session: Mutex<Option<ActiveSession>>,
    /// Bumped whenever the current session ends; tasks from older generations go inert.
    generation: AtomicU64,
    probe_in_flight: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Owns the signed-in session on a client: silent token refresh, the
/// single-active-session probe, and sign-out.
pub struct SessionGuardian<G: AuthGateway + 'static> {
    shared: Arc<Shared<G>>,
}

struct ProbeSlot<'a>(&'a AtomicBool);

impl Drop for ProbeSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<G: AuthGateway + 'static> SessionGuardian<G> {
    pub fn new(gateway: G, config: GuardianConfig, user_agent: Option<String>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                gateway,
                config,
                user_agent,
                state_tx,
                notices,
                session: Mutex::new(None),
                generation: AtomicU64::new(0),
                probe_in_flight: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.shared.notices.subscribe()
    }

    pub fn current_state(&self) -> SessionState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.shared
            .lock_session()
            .as_ref()
            .map(|active| active.tokens.access_token.clone())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedInUser> {
        let shared = &self.shared;
        let tokens = shared.gateway.sign_in(email, password).await?;

        let session_id = match shared
            .gateway
            .register_session(&tokens.access_token, shared.user_agent.clone())
            .await
        {
            Ok(session_id) => session_id,
            Err(err) => {
                if let Err(logout_err) = shared.gateway.sign_out(&tokens.access_token).await {
                    debug!(error = ?logout_err, "session_guardian: cleanup logout failed");
                }
                return Err(err.context("failed to register session marker"));
            }
        };

        // Any previous session on this guardian ends here.
        let generation = shared.end_generation();

        let user = SignedInUser {
            user_id: tokens.user_id,
            email: tokens.email.clone(),
            session_id: session_id.clone(),
        };
        *shared.lock_session() = Some(ActiveSession { tokens, session_id });
        shared
            .state_tx
            .send_replace(SessionState::Authenticated(user.clone()));

        let refresh = tokio::spawn(Shared::run_refresh(Arc::clone(shared), generation));
        let probe = tokio::spawn(Shared::run_probe(Arc::clone(shared), generation));
        shared.lock_tasks().extend([refresh, probe]);

        info!(user_id = %user.user_id, "session_guardian: signed in");
        Ok(user)
    }

    /// Checks the registry once. A no-op while another probe is outstanding.
    pub async fn probe(&self) -> ProbeOutcome {
        let generation = self.shared.generation.load(Ordering::Acquire);
        self.shared.probe(generation).await
    }

    /// Clears local state first; remote revocation is best effort.
    pub async fn sign_out(&self) {
        let shared = &self.shared;
        shared.end_generation();
        let previous = shared.lock_session().take();
        shared.state_tx.send_replace(SessionState::Unauthenticated);
        let _ = shared.notices.send(SessionNotice::SignedOut);

        let Some(active) = previous else {
            return;
        };

        let access_token = &active.tokens.access_token;
        if let Err(err) = shared
            .gateway
            .revoke_session(access_token, &active.session_id)
            .await
        {
            warn!(error = ?err, "session_guardian: remote session revoke failed");
        }
        if let Err(err) = shared.gateway.sign_out(access_token).await {
            warn!(error = ?err, "session_guardian: remote logout failed");
        }
        info!(user_id = %active.tokens.user_id, "session_guardian: signed out");
    }

    /// Cancels both background tasks without touching the published state.
    pub fn teardown(&self) {
        self.shared.end_generation();
    }
}

impl<G: AuthGateway + 'static> Drop for SessionGuardian<G> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<G: AuthGateway + 'static> Shared<G> {
    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<ActiveSession>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Moves to a new generation and aborts the tasks of the old one.
    /// Returns the new generation.
    fn end_generation(&self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let handles = std::mem::take(&mut *self.lock_tasks());
        for handle in handles {
            handle.abort();
        }
        next
    }

    /// Forced sign-out on behalf of a task. Does nothing if `generation` is stale.
    fn expire(&self, generation: u64, notice: SessionNotice) -> bool {
        if self
            .generation
            .compare_exchange(generation, generation + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        self.lock_session().take();
        self.state_tx.send_replace(SessionState::Unauthenticated);
        let _ = self.notices.send(notice);

        let handles = std::mem::take(&mut *self.lock_tasks());
        for handle in handles {
            handle.abort();
        }
        true
    }

    async fn probe(&self, generation: u64) -> ProbeOutcome {
        if self
            .probe_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return ProbeOutcome::Skipped;
        }
        let _slot = ProbeSlot(&self.probe_in_flight);

        let credentials = if self.is_current(generation) {
            self.lock_session()
                .as_ref()
                .map(|active| (active.tokens.access_token.clone(), active.session_id.clone()))
        } else {
            None
        };
        let Some((access_token, session_id)) = credentials else {
            return ProbeOutcome::NoSession;
        };

        match self.gateway.validate_session(&access_token, &session_id).await {
            Ok(true) => ProbeOutcome::Valid,
            Ok(false) => {
                if self.expire(generation, SessionNotice::LoggedInElsewhere) {
                    warn!("session_guardian: session superseded by another sign-in");
                    ProbeOutcome::Invalidated
                } else {
                    ProbeOutcome::NoSession
                }
            }
            Err(err) => {
                warn!(error = ?err, "session_guardian: validity probe failed");
                ProbeOutcome::Failed
            }
        }
    }

    fn refresh_delay(&self) -> Option<Duration> {
        let session = self.lock_session();
        let expires_at = session.as_ref()?.tokens.expires_at;
        let lead = chrono::Duration::from_std(self.config.refresh_lead)
            .unwrap_or_else(|_| chrono::Duration::zero());
        Some((expires_at - lead - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }

    async fn run_refresh(self: Arc<Self>, generation: u64) {
        loop {
            let Some(delay) = self.refresh_delay() else {
                return;
            };
            tokio::time::sleep(delay).await;

            if !self.is_current(generation) {
                return;
            }
            let Some(refresh_token) = self
                .lock_session()
                .as_ref()
                .map(|active| active.tokens.refresh_token.clone())
            else {
                return;
            };

            match self.gateway.refresh(&refresh_token).await {
                Ok(tokens) => {
                    if !self.is_current(generation) {
                        return;
                    }
                    if let Some(active) = self.lock_session().as_mut() {
                        active.tokens = tokens;
                    }
                    debug!("session_guardian: tokens refreshed");
                }
                Err(err) => {
                    warn!(error = ?err, "session_guardian: silent refresh failed");
                    self.expire(generation, SessionNotice::SessionExpired);
                    return;
                }
            }
        }
    }

    async fn run_probe(self: Arc<Self>, generation: u64) {
        let period = self.config.probe_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if !self.is_current(generation) {
                return;
            }
            if self.probe(generation).await == ProbeOutcome::Invalidated {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use crate::session_guardian::auth_gateway::MockAuthGateway;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration};
    use tokio::sync::Notify;
    use uuid::Uuid;

    use super::*;

    /// Scriptable gateway; validate can be held open to simulate a slow probe.
    struct FakeGateway {
        user_id: Uuid,
        token_ttl: ChronoDuration,
        session_valid: AtomicBool,
        refresh_fails: AtomicBool,
        revoke_fails: bool,
        hold_validate: Option<Arc<Notify>>,
        validate_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
        revoke_calls: AtomicUsize,
    }

    impl FakeGateway {
        fn new() -> Self {
            Self {
                user_id: Uuid::new_v4(),
                token_ttl: ChronoDuration::hours(1),
                session_valid: AtomicBool::new(true),
                refresh_fails: AtomicBool::new(false),
                revoke_fails: false,
                hold_validate: None,
                validate_calls: AtomicUsize::new(0),
                refresh_calls: AtomicUsize::new(0),
                revoke_calls: AtomicUsize::new(0),
            }
        }

        fn tokens(&self, expires_at: DateTime<Utc>) -> AuthTokens {
            AuthTokens {
                user_id: self.user_id,
                email: Some("learner@example.com".to_string()),
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at,
            }
        }
    }

    #[async_trait]
    impl AuthGateway for Arc<FakeGateway> {
        async fn sign_in(&self, _email: &str, _password: &str) -> Result<AuthTokens> {
            Ok(self.tokens(Utc::now() + self.token_ttl))
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<AuthTokens> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if self.refresh_fails.load(Ordering::SeqCst) {
                return Err(anyhow!("refresh token revoked"));
            }
            Ok(self.tokens(Utc::now() + self.token_ttl))
        }

        async fn register_session(&self, _access_token: &str, _user_agent: Option<String>) -> Result<String> {
            Ok("session-1".to_string())
        }

        async fn validate_session(&self, _access_token: &str, _session_id: &str) -> Result<bool> {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(hold) = &self.hold_validate {
                hold.notified().await;
            }
            Ok(self.session_valid.load(Ordering::SeqCst))
        }

        async fn revoke_session(&self, _access_token: &str, _session_id: &str) -> Result<()> {
            self.revoke_calls.fetch_add(1, Ordering::SeqCst);
            if self.revoke_fails {
                return Err(anyhow!("registry unavailable"));
            }
            Ok(())
        }

        async fn sign_out(&self, _access_token: &str) -> Result<()> {
            Ok(())
        }
    }

    fn quiet_config() -> GuardianConfig {
        GuardianConfig {
            probe_interval: Duration::from_secs(3600),
            refresh_lead: Duration::from_secs(300),
        }
    }

    #[tokio::test]
    async fn sign_in_publishes_authenticated_state() {
        let gateway = Arc::new(FakeGateway::new());
        let guardian = SessionGuardian::new(Arc::clone(&gateway), quiet_config(), None);
        let state = guardian.state();

        let user = guardian.sign_in("learner@example.com", "pw").await.unwrap();

        assert_eq!(user.session_id, "session-1");
        assert_eq!(*state.borrow(), SessionState::Authenticated(user));
        assert_eq!(guardian.access_token().as_deref(), Some("access"));
    }

    #[tokio::test]
    async fn register_failure_leaves_guardian_unauthenticated() {
        let mut gateway = MockAuthGateway::new();
        let user_id = Uuid::new_v4();
        gateway.expect_sign_in().returning(move |_, _| {
            Box::pin(async move {
                Ok(AuthTokens {
                    user_id,
                    email: None,
                    access_token: "a".to_string(),
                    refresh_token: "r".to_string(),
                    expires_at: Utc::now() + ChronoDuration::hours(1),
                })
            })
        });
        gateway
            .expect_register_session()
            .returning(|_, _| Box::pin(async { Err(anyhow!("registry down")) }));
        gateway
            .expect_sign_out()
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let guardian = SessionGuardian::new(gateway, quiet_config(), None);

        assert!(guardian.sign_in("a@b.c", "pw").await.is_err());
        assert_eq!(guardian.current_state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn invalid_probe_forces_sign_out_with_notice() {
        let gateway = Arc::new(FakeGateway::new());
        let guardian = SessionGuardian::new(Arc::clone(&gateway), quiet_config(), None);
        let mut notices = guardian.notices();
        guardian.sign_in("learner@example.com", "pw").await.unwrap();

        gateway.session_valid.store(false, Ordering::SeqCst);

        assert_eq!(guardian.probe().await, ProbeOutcome::Invalidated);
        assert_eq!(guardian.current_state(), SessionState::Unauthenticated);
        assert_eq!(notices.recv().await.unwrap(), SessionNotice::LoggedInElsewhere);
        assert!(guardian.access_token().is_none());
    }

    #[tokio::test]
    async fn overlapping_probe_is_skipped() {
        let hold = Arc::new(Notify::new());
        let mut fake = FakeGateway::new();
        fake.hold_validate = Some(Arc::clone(&hold));
        let gateway = Arc::new(fake);
        let guardian = SessionGuardian::new(Arc::clone(&gateway), quiet_config(), None);
        guardian.sign_in("learner@example.com", "pw").await.unwrap();

        let (first, second) = tokio::join!(guardian.probe(), async {
            let outcome = guardian.probe().await;
            hold.notify_one();
            outcome
        });

        assert_eq!(first, ProbeOutcome::Valid);
        assert_eq!(second, ProbeOutcome::Skipped);
        assert_eq!(gateway.validate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_error_keeps_session() {
        let mut gateway = MockAuthGateway::new();
        let user_id = Uuid::new_v4();
        gateway.expect_sign_in().returning(move |_, _| {
            Box::pin(async move {
                Ok(AuthTokens {
                    user_id,
                    email: None,
                    access_token: "a".to_string(),
                    refresh_token: "r".to_string(),
                    expires_at: Utc::now() + ChronoDuration::hours(1),
                })
            })
        });
        gateway
            .expect_register_session()
            .returning(|_, _| Box::pin(async { Ok("s-1".to_string()) }));
        gateway
            .expect_validate_session()
            .returning(|_, _| Box::pin(async { Err(anyhow!("connection reset")) }));

        let guardian = SessionGuardian::new(gateway, quiet_config(), None);
        guardian.sign_in("a@b.c", "pw").await.unwrap();

        assert_eq!(guardian.probe().await, ProbeOutcome::Failed);
        assert!(guardian.current_state().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_expires_session() {
        let mut fake = FakeGateway::new();
        fake.token_ttl = ChronoDuration::minutes(10);
        fake.refresh_fails.store(true, Ordering::SeqCst);
        let gateway = Arc::new(fake);
        let guardian = SessionGuardian::new(Arc::clone(&gateway), quiet_config(), None);
        let mut notices = guardian.notices();
        guardian.sign_in("learner@example.com", "pw").await.unwrap();

        let notice = notices.recv().await.unwrap();

        assert_eq!(notice, SessionNotice::SessionExpired);
        assert_eq!(guardian.current_state(), SessionState::Unauthenticated);
        assert_eq!(gateway.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_refresh_keeps_session_and_replaces_tokens() {
        let mut fake = FakeGateway::new();
        fake.token_ttl = ChronoDuration::minutes(6);
        let gateway = Arc::new(fake);
        let guardian = SessionGuardian::new(Arc::clone(&gateway), quiet_config(), None);
        guardian.sign_in("learner@example.com", "pw").await.unwrap();

        tokio::time::sleep(Duration::from_secs(90)).await;

        assert!(gateway.refresh_calls.load(Ordering::SeqCst) >= 1);
        assert!(guardian.current_state().is_authenticated());
    }

    #[tokio::test]
    async fn sign_out_clears_state_even_when_revoke_fails() {
        let mut fake = FakeGateway::new();
        fake.revoke_fails = true;
        let gateway = Arc::new(fake);
        let guardian = SessionGuardian::new(Arc::clone(&gateway), quiet_config(), None);
        let mut notices = guardian.notices();
        guardian.sign_in("learner@example.com", "pw").await.unwrap();

        guardian.sign_out().await;

        assert_eq!(guardian.current_state(), SessionState::Unauthenticated);
        assert_eq!(notices.recv().await.unwrap(), SessionNotice::SignedOut);
        assert_eq!(gateway.revoke_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_generation_probe_does_not_act() {
        let gateway = Arc::new(FakeGateway::new());
        let guardian = SessionGuardian::new(Arc::clone(&gateway), quiet_config(), None);
        guardian.sign_in("learner@example.com", "pw").await.unwrap();
        let stale = guardian.shared.generation.load(Ordering::SeqCst);

        guardian.sign_out().await;
        guardian.sign_in("learner@example.com", "pw").await.unwrap();
        gateway.session_valid.store(false, Ordering::SeqCst);

        assert_eq!(guardian.shared.probe(stale).await, ProbeOutcome::NoSession);
        assert!(guardian.current_state().is_authenticated());
        assert_eq!(gateway.validate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_guardian_stops_background_probes() {
        let gateway = Arc::new(FakeGateway::new());
        let config = GuardianConfig {
            probe_interval: Duration::from_secs(30),
            refresh_lead: Duration::from_secs(300),
        };
        let guardian = SessionGuardian::new(Arc::clone(&gateway), config, None);
        guardian.sign_in("learner@example.com", "pw").await.unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        let before = gateway.validate_calls.load(Ordering::SeqCst);
        assert_eq!(before, 1);

        drop(guardian);
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(gateway.validate_calls.load(Ordering::SeqCst), before);
    }
}
