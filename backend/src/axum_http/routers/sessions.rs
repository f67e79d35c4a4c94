use crate::{
    auth::AuthUser, axum_http::error_responses::AppError,
    usecases::user_sessions::SessionRegistryUseCase,
};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::IntoResponse,
    routing::post,
};
use harita::{
    domain::{
        repositories::user_sessions::UserSessionRepository,
        value_objects::sessions::{RegisterSessionModel, SessionIdModel, SessionValidityDto},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::user_sessions::UserSessionPostgres,
    },
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct RevokeSessionDto {
    pub revoked: bool,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let session_repository = UserSessionPostgres::new(Arc::clone(&db_pool));
    let sessions_usecase = SessionRegistryUseCase::new(Arc::new(session_repository));

    Router::new()
        .route("/register", post(register_session))
        .route("/validate", post(validate_session))
        .route("/revoke", post(revoke_session))
        .with_state(Arc::new(sessions_usecase))
}

pub async fn register_session<R>(
    State(usecase): State<Arc<SessionRegistryUseCase<R>>>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Option<Json<RegisterSessionModel>>,
) -> Result<impl IntoResponse, AppError>
where
    R: UserSessionRepository + Send + Sync + 'static,
{
    let model = body.map(|Json(model)| model).unwrap_or_default();
    let user_agent = model.user_agent.or_else(|| {
        headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });

    let marker = usecase
        .register(auth.user_id, user_agent)
        .await
        .inspect_err(|err| error!(user_id = %auth.user_id, error = ?err, "sessions: register failed"))?;

    Ok((StatusCode::CREATED, Json(marker)))
}

pub async fn validate_session<R>(
    State(usecase): State<Arc<SessionRegistryUseCase<R>>>,
    auth: AuthUser,
    Json(model): Json<SessionIdModel>,
) -> Result<impl IntoResponse, AppError>
where
    R: UserSessionRepository + Send + Sync + 'static,
{
    let Ok(session_id) = Uuid::parse_str(model.session_id.trim()) else {
        debug!(user_id = %auth.user_id, "sessions: malformed session id probed");
        return Ok((StatusCode::OK, Json(SessionValidityDto { valid: false })));
    };

    let validity = usecase
        .validate(auth.user_id, session_id)
        .await
        .inspect_err(|err| error!(user_id = %auth.user_id, error = ?err, "sessions: validate failed"))?;

    Ok((StatusCode::OK, Json(validity)))
}

pub async fn revoke_session<R>(
    State(usecase): State<Arc<SessionRegistryUseCase<R>>>,
    auth: AuthUser,
    Json(model): Json<SessionIdModel>,
) -> Result<impl IntoResponse, AppError>
where
    R: UserSessionRepository + Send + Sync + 'static,
{
    let session_id = Uuid::parse_str(model.session_id.trim())
        .map_err(|_| AppError::BadRequest("session_id must be a UUID".to_string()))?;

    let revoked = usecase
        .revoke(auth.user_id, session_id)
        .await
        .inspect_err(|err| error!(user_id = %auth.user_id, error = ?err, "sessions: revoke failed"))?;

    Ok((StatusCode::OK, Json(RevokeSessionDto { revoked })))
}
