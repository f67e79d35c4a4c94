use crate::{
    auth::AuthUser,
    axum_http::error_responses::error_response,
    usecases::entitlements::EntitlementResolver,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use harita::{
    domain::{
        policies::entitlement_overrides::{EntitlementOverridePolicy, StaticOverridePolicy},
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            entitlements::{Entitlement, EntitlementDto},
            enums::subscription_tiers::SubscriptionTier,
            subscriptions::AccessDto,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::subscriptions::SubscriptionPostgres,
    },
};
use std::sync::Arc;

pub fn routes(db_pool: Arc<PgPoolSquad>, override_policy: Arc<StaticOverridePolicy>) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let resolver = EntitlementResolver::new(Arc::new(subscription_repository), override_policy);

    Router::new()
        .route("/me", get(current_entitlement))
        .route("/anonymous", get(anonymous_entitlement))
        .route("/access/:tier", get(check_access))
        .with_state(Arc::new(resolver))
}

pub async fn current_entitlement<S, P>(
    State(resolver): State<Arc<EntitlementResolver<S, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    let identity = auth.identity();
    let entitlement = resolver.resolve(Some(&identity)).await;
    (StatusCode::OK, Json(EntitlementDto::from(entitlement)))
}

pub async fn anonymous_entitlement() -> impl IntoResponse {
    (StatusCode::OK, Json(EntitlementDto::from(Entitlement::anonymous())))
}

pub async fn check_access<S, P>(
    State(resolver): State<Arc<EntitlementResolver<S, P>>>,
    auth: AuthUser,
    Path(tier): Path<String>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: EntitlementOverridePolicy + 'static,
{
    let Some(required) = SubscriptionTier::parse(&tier) else {
        return error_response(StatusCode::BAD_REQUEST, format!("unknown tier: {tier}"));
    };

    let identity = auth.identity();
    let allowed = resolver.has_access(required, Some(&identity)).await;
    (StatusCode::OK, Json(AccessDto { allowed })).into_response()
}
