use crate::{
    auth::AuthUser,
    usecases::{
        entitlements::EntitlementResolver,
        live_sync::{LiveSyncError, LiveSyncUseCase},
    },
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use harita::{
    domain::{
        policies::entitlement_overrides::StaticOverridePolicy,
        value_objects::enums::subscription_tiers::SubscriptionTier,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            live_sessions::LiveSessionPostgres, recordings::RecordingPostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
    youtube::youtube_client::YoutubeClient,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

type LiveSync = LiveSyncUseCase<LiveSessionPostgres, RecordingPostgres, YoutubeClient>;
type Resolver = EntitlementResolver<SubscriptionPostgres, StaticOverridePolicy>;

#[derive(Clone)]
pub struct LiveSessionsState {
    live_sync: Arc<LiveSync>,
    resolver: Arc<Resolver>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<i64>,
}

impl ListQuery {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    youtube: Arc<YoutubeClient>,
    override_policy: Arc<StaticOverridePolicy>,
) -> Router {
    let live_session_repository = LiveSessionPostgres::new(Arc::clone(&db_pool));
    let recording_repository = RecordingPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));

    let state = LiveSessionsState {
        live_sync: Arc::new(LiveSyncUseCase::new(
            Arc::new(live_session_repository),
            Arc::new(recording_repository),
            youtube,
        )),
        resolver: Arc::new(EntitlementResolver::new(
            Arc::new(subscription_repository),
            override_policy,
        )),
    };

    Router::new()
        .route("/", get(list_sessions))
        .route("/recordings", get(list_recordings))
        .route("/sync", post(trigger_sync))
        .with_state(state)
}

pub async fn list_sessions(
    State(state): State<LiveSessionsState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match state.live_sync.recent_sessions(query.limit()).await {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(err) => {
            error!(error = ?err, "live_sync: listing sessions failed");
            err.into_response()
        }
    }
}

pub async fn list_recordings(
    State(state): State<LiveSessionsState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match state.live_sync.recent_recordings(query.limit()).await {
        Ok(recordings) => (StatusCode::OK, Json(recordings)).into_response(),
        Err(err) => {
            error!(error = ?err, "live_sync: listing recordings failed");
            err.into_response()
        }
    }
}

pub async fn trigger_sync(
    State(state): State<LiveSessionsState>,
    auth: AuthUser,
) -> impl IntoResponse {
    let identity = auth.identity();
    if !state
        .resolver
        .has_access(SubscriptionTier::Enterprise, Some(&identity))
        .await
    {
        warn!(user_id = %auth.user_id, "live_sync: manual sync refused");
        return LiveSyncError::Forbidden.into_response();
    }

    info!(user_id = %auth.user_id, "live_sync: manual sync requested");
    let report = state.live_sync.run_all().await;
    let status = if report.all_ok() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (status, Json(report)).into_response()
}
