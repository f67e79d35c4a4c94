use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::state::{AuthEndpoints, AuthTokens};

/// Remote calls the guardian depends on: Supabase Auth for tokens and the
/// backend session registry for the single-session marker.
#[async_trait]
#[automock]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens>;
    async fn register_session(&self, access_token: &str, user_agent: Option<String>) -> Result<String>;
    async fn validate_session(&self, access_token: &str, session_id: &str) -> Result<bool>;
    async fn revoke_session(&self, access_token: &str, session_id: &str) -> Result<()>;
    async fn sign_out(&self, access_token: &str) -> Result<()>;
}

pub struct HttpAuthGateway {
    http: reqwest::Client,
    endpoints: AuthEndpoints,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SupabaseTokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: SupabaseUser,
}

impl From<SupabaseTokenResponse> for AuthTokens {
    fn from(value: SupabaseTokenResponse) -> Self {
        let expires_at = value
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| Utc::now() + ChronoDuration::seconds(value.expires_in.unwrap_or(3600)));

        AuthTokens {
            user_id: value.user.id,
            email: value.user.email,
            access_token: value.access_token,
            refresh_token: value.refresh_token,
            expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct RegisterSessionBody {
    user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionMarkerBody {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionValidityBody {
    valid: bool,
}

impl HttpAuthGateway {
    pub fn new(endpoints: AuthEndpoints) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build auth http client")?;

        Ok(Self { http, endpoints })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.endpoints.supabase_url.trim_end_matches('/'), path)
    }

    fn registry_url(&self, action: &str) -> String {
        format!(
            "{}/api/v1/sessions/{}",
            self.endpoints.backend_url.trim_end_matches('/'),
            action
        )
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<AuthTokens> {
        let resp = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.endpoints.anon_key)
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, grant_type).await?;
        Ok(resp.json::<SupabaseTokenResponse>().await?.into())
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "session_guardian: auth request failed"
        );

        anyhow::bail!("auth request failed: {} (status {})", context, status);
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn register_session(&self, access_token: &str, user_agent: Option<String>) -> Result<String> {
        let resp = self
            .http
            .post(self.registry_url("register"))
            .bearer_auth(access_token)
            .json(&RegisterSessionBody { user_agent })
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "register session").await?;
        Ok(resp.json::<SessionMarkerBody>().await?.session_id)
    }

    async fn validate_session(&self, access_token: &str, session_id: &str) -> Result<bool> {
        let resp = self
            .http
            .post(self.registry_url("validate"))
            .bearer_auth(access_token)
            .json(&json!({ "session_id": session_id }))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "validate session").await?;
        Ok(resp.json::<SessionValidityBody>().await?.valid)
    }

    async fn revoke_session(&self, access_token: &str, session_id: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.registry_url("revoke"))
            .bearer_auth(access_token)
            .json(&json!({ "session_id": session_id }))
            .send()
            .await?;
        Self::ensure_success(resp, "revoke session").await?;
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.endpoints.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::ensure_success(resp, "logout").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpAuthGateway {
        HttpAuthGateway::new(AuthEndpoints {
            supabase_url: "https://project.supabase.co/".to_string(),
            anon_key: "anon".to_string(),
            backend_url: "http://localhost:8080".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn urls_are_joined_without_double_slashes() {
        let gateway = gateway();
        assert_eq!(gateway.auth_url("token"), "https://project.supabase.co/auth/v1/token");
        assert_eq!(
            gateway.registry_url("validate"),
            "http://localhost:8080/api/v1/sessions/validate"
        );
    }

    #[test]
    fn token_response_prefers_absolute_expiry() {
        let user_id = Uuid::new_v4();
        let raw = json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "user": { "id": user_id, "email": "learner@example.com" }
        });
        let tokens: AuthTokens = serde_json::from_value::<SupabaseTokenResponse>(raw)
            .unwrap()
            .into();

        assert_eq!(tokens.user_id, user_id);
        assert_eq!(tokens.expires_at.timestamp(), 1_900_000_000);
        assert_eq!(tokens.email.as_deref(), Some("learner@example.com"));
    }
}
