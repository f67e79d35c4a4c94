use crate::{
    auth::AuthUser,
    axum_http::error_responses::error_response,
    usecases::{entitlements::EntitlementResolver, subscriptions::SubscriptionUseCase},
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
        policies::entitlement_overrides::{EntitlementOverridePolicy, StaticOverridePolicy},
        repositories::{
            premium_content::PremiumContentRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::subscriptions::{
            AccessDto, ContentAccessQuery, MarkPremiumContentModel, UpgradeSubscriptionModel,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            premium_content::PremiumContentPostgres, subscriptions::SubscriptionPostgres,
        },
    },
};
use std::sync::Arc;
use tracing::error;

pub fn routes(db_pool: Arc<PgPoolSquad>, override_policy: Arc<StaticOverridePolicy>) -> Router {
    let subscription_repository = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));
    let premium_content_repository = PremiumContentPostgres::new(Arc::clone(&db_pool));
    let resolver = EntitlementResolver::new(Arc::clone(&subscription_repository), override_policy);

    let subscriptions_usecase = SubscriptionUseCase::new(
        subscription_repository,
        Arc::new(premium_content_repository),
        Arc::new(resolver),
    );

    Router::new()
        .route("/current", get(current_subscription))
        .route("/premium-access", get(premium_access))
        .route("/upgrade", post(upgrade))
        .route("/cancel", post(cancel))
        .route("/content-access", get(content_access))
        .route("/premium-content", post(mark_premium_content))
        .with_state(Arc::new(subscriptions_usecase))
}

pub async fn current_subscription<S, C, P>(
    State(usecase): State<Arc<SubscriptionUseCase<S, C, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: PremiumContentRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    match usecase.current_subscription(auth.user_id).await {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => {
            error!(user_id = %auth.user_id, error = ?err, "subscriptions: current lookup failed");
            err.into_response()
        }
    }
}

pub async fn premium_access<S, C, P>(
    State(usecase): State<Arc<SubscriptionUseCase<S, C, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: PremiumContentRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    let allowed = usecase.premium_access(auth.user_id).await;
    (StatusCode::OK, Json(AccessDto { allowed }))
}

pub async fn upgrade<S, C, P>(
    State(usecase): State<Arc<SubscriptionUseCase<S, C, P>>>,
    auth: AuthUser,
    Json(model): Json<UpgradeSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: PremiumContentRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    match usecase.upgrade(auth.user_id, model.tier).await {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => {
            error!(user_id = %auth.user_id, error = ?err, "subscriptions: upgrade failed");
            err.into_response()
        }
    }
}

pub async fn cancel<S, C, P>(
    State(usecase): State<Arc<SubscriptionUseCase<S, C, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: PremiumContentRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    match usecase.cancel(auth.user_id).await {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => {
            error!(user_id = %auth.user_id, error = ?err, "subscriptions: cancel failed");
            err.into_response()
        }
    }
}

pub async fn content_access<S, C, P>(
    State(usecase): State<Arc<SubscriptionUseCase<S, C, P>>>,
    auth: AuthUser,
    Query(query): Query<ContentAccessQuery>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: PremiumContentRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    if query.content_type.trim().is_empty() || query.content_id.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "content_type and content_id are required",
        );
    }

    let allowed = usecase
        .check_content_access(auth.user_id, &query.content_type, &query.content_id)
        .await;
    (StatusCode::OK, Json(AccessDto { allowed })).into_response()
}

pub async fn mark_premium_content<S, C, P>(
    State(usecase): State<Arc<SubscriptionUseCase<S, C, P>>>,
    auth: AuthUser,
    Json(model): Json<MarkPremiumContentModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: PremiumContentRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    match usecase.mark_content_premium(&auth.identity(), model).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!(user_id = %auth.user_id, error = ?err, "subscriptions: mark premium failed");
            err.into_response()
        }
    }
}
