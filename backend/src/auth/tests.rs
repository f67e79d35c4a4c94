use super::*;
use axum::http::{Request, header::AUTHORIZATION};
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const SUB: &str = "123e4567-e89b-12d3-a456-426614174000";

fn claims(role: &str, exp: usize) -> SupabaseClaims {
    SupabaseClaims {
        sub: SUB.to_string(),
        role: role.to_string(),
        email: Some("learner@example.com".to_string()),
        exp,
    }
}

/// Supabase puts the role in `aud` as well.
fn token_with(secret: &str, claims: &SupabaseClaims) -> String {
    let mut value = serde_json::to_value(claims).unwrap();
    value["aud"] = serde_json::Value::String(claims.role.clone());
    encode(
        &Header::default(),
        &value,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn valid_token_passes() {
    let token = token_with(SECRET, &claims("authenticated", 9_999_999_999));

    let decoded = validate_supabase_jwt(&token, SECRET).expect("valid token should pass");
    assert_eq!(decoded.sub, SUB);
    assert_eq!(decoded.email.as_deref(), Some("learner@example.com"));
}

#[test]
fn expired_token_is_rejected() {
    let token = token_with(SECRET, &claims("authenticated", 1));
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn wrong_signature_is_rejected() {
    let token = token_with("wrongsecret", &claims("authenticated", 9_999_999_999));
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn unexpected_audience_is_rejected() {
    let token = token_with(SECRET, &claims("anon", 9_999_999_999));
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[tokio::test]
async fn extractor_builds_identity_from_bearer_token() {
    unsafe {
        std::env::set_var("SUPABASE_JWT_SECRET", SECRET);
    }
    let token = token_with(SECRET, &claims("authenticated", 9_999_999_999));
    let request = Request::builder()
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    let identity = user.identity();

    assert_eq!(identity.user_id.to_string(), SUB);
    assert_eq!(identity.email.as_deref(), Some("learner@example.com"));
}

#[tokio::test]
async fn extractor_rejects_missing_header() {
    let request = Request::builder().body(()).unwrap();
    let (mut parts, _) = request.into_parts();

    let (status, _) = AuthUser::from_request_parts(&mut parts, &())
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
