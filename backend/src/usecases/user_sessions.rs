use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use harita::domain::{
    entities::user_sessions::UserSessionEntity,
    repositories::user_sessions::UserSessionRepository,
    value_objects::sessions::{SessionMarkerDto, SessionValidityDto},
};
use tracing::{debug, info};
use uuid::Uuid;

const USER_AGENT_MAX_LEN: usize = 512;

/// Server side of single-active-session: the newest registration wins.
pub struct SessionRegistryUseCase<R>
where
    R: UserSessionRepository + Send + Sync + 'static,
{
    session_repo: Arc<R>,
}

impl<R> SessionRegistryUseCase<R>
where
    R: UserSessionRepository + Send + Sync + 'static,
{
    pub fn new(session_repo: Arc<R>) -> Self {
        Self { session_repo }
    }

    pub async fn register(
        &self,
        user_id: Uuid,
        user_agent: Option<String>,
    ) -> Result<SessionMarkerDto> {
        let now = Utc::now();
        let session_id = Uuid::new_v4();
        let user_agent = user_agent.map(|agent| agent.chars().take(USER_AGENT_MAX_LEN).collect());

        self.session_repo
            .replace_active_session(UserSessionEntity {
                user_id,
                session_id,
                user_agent,
                created_at: now,
                last_seen_at: now,
            })
            .await?;

        info!(%user_id, %session_id, "sessions: registered; previous sessions invalidated");
        Ok(SessionMarkerDto { session_id })
    }

    pub async fn validate(&self, user_id: Uuid, session_id: Uuid) -> Result<SessionValidityDto> {
        let valid = self.session_repo.touch_if_active(user_id, session_id).await?;
        if !valid {
            debug!(%user_id, %session_id, "sessions: stale session probed");
        }
        Ok(SessionValidityDto { valid })
    }

    pub async fn revoke(&self, user_id: Uuid, session_id: Uuid) -> Result<bool> {
        let revoked = self.session_repo.revoke(user_id, session_id).await?;
        info!(%user_id, %session_id, revoked, "sessions: revoke requested");
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;

    use super::*;

    /// One row per user, like the `user_sessions` primary key.
    #[derive(Default)]
    struct InMemorySessions {
        rows: Mutex<HashMap<Uuid, UserSessionEntity>>,
    }

    #[async_trait]
    impl UserSessionRepository for InMemorySessions {
        async fn replace_active_session(&self, entity: UserSessionEntity) -> Result<()> {
            self.rows.lock().unwrap().insert(entity.user_id, entity);
            Ok(())
        }

        async fn touch_if_active(&self, user_id: Uuid, session_id: Uuid) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&user_id) {
                Some(row) if row.session_id == session_id => {
                    row.last_seen_at = Utc::now();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn revoke(&self, user_id: Uuid, session_id: Uuid) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            if rows.get(&user_id).is_some_and(|row| row.session_id == session_id) {
                rows.remove(&user_id);
                return Ok(true);
            }
            Ok(false)
        }
    }

    #[tokio::test]
    async fn second_registration_invalidates_the_first() {
        let usecase = SessionRegistryUseCase::new(Arc::new(InMemorySessions::default()));
        let user_id = Uuid::new_v4();

        let laptop = usecase.register(user_id, Some("laptop".to_string())).await.unwrap();
        assert!(usecase.validate(user_id, laptop.session_id).await.unwrap().valid);

        let phone = usecase.register(user_id, Some("phone".to_string())).await.unwrap();

        assert!(!usecase.validate(user_id, laptop.session_id).await.unwrap().valid);
        assert!(usecase.validate(user_id, phone.session_id).await.unwrap().valid);
    }

    #[tokio::test]
    async fn revoke_only_removes_matching_session() {
        let usecase = SessionRegistryUseCase::new(Arc::new(InMemorySessions::default()));
        let user_id = Uuid::new_v4();
        let current = usecase.register(user_id, None).await.unwrap();

        assert!(!usecase.revoke(user_id, Uuid::new_v4()).await.unwrap());
        assert!(usecase.validate(user_id, current.session_id).await.unwrap().valid);

        assert!(usecase.revoke(user_id, current.session_id).await.unwrap());
        assert!(!usecase.validate(user_id, current.session_id).await.unwrap().valid);
    }

    #[tokio::test]
    async fn sessions_are_scoped_per_user() {
        let usecase = SessionRegistryUseCase::new(Arc::new(InMemorySessions::default()));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let alice_session = usecase.register(alice, None).await.unwrap();
        usecase.register(bob, None).await.unwrap();

        assert!(usecase.validate(alice, alice_session.session_id).await.unwrap().valid);
        assert!(!usecase.validate(bob, alice_session.session_id).await.unwrap().valid);
    }
}
