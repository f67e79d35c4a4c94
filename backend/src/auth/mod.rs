use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use harita::domain::value_objects::entitlements::Identity;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::config_loader;

#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    pub role: String,
    pub email: Option<String>,
    pub exp: usize,
}

/// Caller identity taken from a verified Supabase access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: String,
}

impl AuthUser {
    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id, self.email.clone())
    }
}

pub fn validate_supabase_jwt(token: &str, secret: &str) -> anyhow::Result<SupabaseClaims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.set_audience(&["authenticated", "service_role"]);

    let token_data = decode::<SupabaseClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

fn unauthorized(message: &str) -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, message.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or_else(|| unauthorized("Missing Authorization header"))?
            .to_str()
            .map_err(|_| unauthorized("Invalid Authorization header"))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

        let secret = config_loader::get_jwt_secret().map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication is not configured".to_string(),
            )
        })?;

        let claims = validate_supabase_jwt(token, &secret)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| unauthorized("Invalid user ID in token"))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests;
