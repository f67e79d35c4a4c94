use crate::{
    auth::AuthUser,
    usecases::assistant::{AssistantUseCase, ChatCompletionGateway},
};
use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use harita::{
    domain::{
        repositories::{
            assistant_context::AssistantContextRepository, conversations::ConversationRepository,
        },
        value_objects::assistant::ChatRequest,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            assistant_context::AssistantContextPostgres, conversations::ConversationPostgres,
        },
    },
    openai::openai_client::OpenAiClient,
};
use std::sync::Arc;
use tracing::warn;

pub fn routes(db_pool: Arc<PgPoolSquad>, openai: Arc<OpenAiClient>) -> Router {
    let context_repository = AssistantContextPostgres::new(Arc::clone(&db_pool));
    let conversation_repository = ConversationPostgres::new(Arc::clone(&db_pool));

    let assistant_usecase = AssistantUseCase::new(
        Arc::new(context_repository),
        Arc::new(conversation_repository),
        openai,
    );

    Router::new()
        .route("/chat", post(chat))
        .with_state(Arc::new(assistant_usecase))
}

pub async fn chat<Ctx, Conv, Llm>(
    State(usecase): State<Arc<AssistantUseCase<Ctx, Conv, Llm>>>,
    auth: AuthUser,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse
where
    Ctx: AssistantContextRepository + Send + Sync + 'static,
    Conv: ConversationRepository + Send + Sync + 'static,
    Llm: ChatCompletionGateway + 'static,
{
    match usecase.chat(auth.user_id, request).await {
        // Fallback replies still carry a usable body for the widget.
        Ok(reply) if reply.is_fallback() => {
            warn!(user_id = %auth.user_id, "assistant: served fallback reply");
            (StatusCode::BAD_GATEWAY, Json(reply)).into_response()
        }
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => err.into_response(),
    }
}
