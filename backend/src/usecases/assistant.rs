use std::{fmt::Write as _, sync::Arc};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use harita::{
    domain::{
        entities::conversations::{InsertAssistantMemoryEntity, InsertConversationTurnEntity},
        repositories::{
            assistant_context::AssistantContextRepository, conversations::ConversationRepository,
        },
        value_objects::{
            assistant::{
                AssistantErrorBody, AssistantReply, CONTEXT_MATCH_LIMIT, ChatMessage, ChatRequest,
                ContentMatch, ContentSource, FALLBACK_RESPONSE, HISTORY_TURN_LIMIT, KEYWORD_LIMIT,
                UserContext, extract_keywords, rank_matches, suggested_actions,
            },
            enums::conversation_intents::ConversationIntent,
        },
    },
    openai::openai_client::OpenAiClient,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const MAX_MESSAGE_CHARS: usize = 4000;
const SEARCH_LIMIT_PER_SOURCE: i64 = 5;
const SEARCH_SOURCES: [ContentSource; 3] = [
    ContentSource::CodeSnippet,
    ContentSource::Template,
    ContentSource::Tool,
];

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletionGateway: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> AnyResult<String>;
}

#[async_trait]
impl ChatCompletionGateway for OpenAiClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> AnyResult<String> {
        self.chat_completion(&messages).await
    }
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("message must be at most {MAX_MESSAGE_CHARS} characters")]
    MessageTooLong,
}

impl AssistantError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::BAD_REQUEST
    }
}

pub struct AssistantUseCase<Ctx, Conv, Llm>
where
    Ctx: AssistantContextRepository + Send + Sync + 'static,
    Conv: ConversationRepository + Send + Sync + 'static,
    Llm: ChatCompletionGateway + 'static,
{
    context_repo: Arc<Ctx>,
    conversation_repo: Arc<Conv>,
    llm: Arc<Llm>,
}

impl<Ctx, Conv, Llm> AssistantUseCase<Ctx, Conv, Llm>
where
    Ctx: AssistantContextRepository + Send + Sync + 'static,
    Conv: ConversationRepository + Send + Sync + 'static,
    Llm: ChatCompletionGateway + 'static,
{
    pub fn new(context_repo: Arc<Ctx>, conversation_repo: Arc<Conv>, llm: Arc<Llm>) -> Self {
        Self {
            context_repo,
            conversation_repo,
            llm,
        }
    }

    /// Only input validation fails; a language model failure yields the
    /// fallback reply with an `error` body.
    pub async fn chat(
        &self,
        user_id: Uuid,
        request: ChatRequest,
    ) -> Result<AssistantReply, AssistantError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AssistantError::EmptyMessage);
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AssistantError::MessageTooLong);
        }

        let conversation_id = request.conversation_id.unwrap_or_else(Uuid::new_v4);
        let context_type = request.context_type.as_deref();

        let user_context = match self.context_repo.load_user_context(user_id).await {
            Ok(context) => Some(context),
            Err(err) => {
                warn!(%user_id, error = ?err, "assistant: user context unavailable");
                None
            }
        };

        let keywords = extract_keywords(message, KEYWORD_LIMIT);
        let matches = self.search_content(&keywords).await;
        let system_prompt = build_system_prompt(user_context.as_ref(), &matches, context_type);

        let mut messages = vec![ChatMessage::system(system_prompt)];
        messages.extend(self.history(conversation_id, user_id).await);
        messages.push(ChatMessage::user(message));

        let response = match self.llm.complete(messages).await {
            Ok(response) => response,
            Err(err) => {
                error!(%user_id, %conversation_id, error = ?err, "assistant: completion failed");
                return Ok(AssistantReply {
                    conversation_id,
                    response: FALLBACK_RESPONSE.to_string(),
                    suggested_actions: Vec::new(),
                    context_used: Vec::new(),
                    error: Some(AssistantErrorBody {
                        code: "llm_unavailable",
                        message: "The assistant could not generate a response.".to_string(),
                    }),
                });
            }
        };

        let snippets = serde_json::to_value(&matches).unwrap_or_default();
        if let Err(err) = self
            .conversation_repo
            .insert_turn(InsertConversationTurnEntity {
                conversation_id,
                user_id,
                context_type: request.context_type.clone(),
                user_message: message.to_string(),
                assistant_response: response.clone(),
                context_snippets: snippets,
            })
            .await
        {
            error!(%user_id, %conversation_id, error = ?err, "assistant: failed to persist turn");
        }

        let intent = ConversationIntent::classify(message);
        if let Err(err) = self
            .conversation_repo
            .insert_memory(InsertAssistantMemoryEntity {
                user_id,
                conversation_id,
                topics: keywords,
                intent: intent.as_str().to_string(),
            })
            .await
        {
            debug!(%user_id, error = ?err, "assistant: memory record skipped");
        }

        info!(
            %user_id,
            %conversation_id,
            context_matches = matches.len(),
            intent = intent.as_str(),
            "assistant: reply generated"
        );

        Ok(AssistantReply {
            conversation_id,
            response,
            suggested_actions: suggested_actions(message),
            context_used: matches,
            error: None,
        })
    }

    async fn search_content(&self, keywords: &[String]) -> Vec<ContentMatch> {
        if keywords.is_empty() {
            return Vec::new();
        }

        let mut found = Vec::new();
        for source in SEARCH_SOURCES {
            match self
                .context_repo
                .search(source, keywords.to_vec(), SEARCH_LIMIT_PER_SOURCE)
                .await
            {
                Ok(matches) => found.extend(matches),
                Err(err) => warn!(?source, error = ?err, "assistant: content search failed"),
            }
        }
        rank_matches(found, CONTEXT_MATCH_LIMIT)
    }

    /// Prior turns, oldest first.
    async fn history(&self, conversation_id: Uuid, user_id: Uuid) -> Vec<ChatMessage> {
        let turns = match self
            .conversation_repo
            .recent_turns(conversation_id, user_id, HISTORY_TURN_LIMIT)
            .await
        {
            Ok(turns) => turns,
            Err(err) => {
                warn!(%conversation_id, error = ?err, "assistant: history unavailable");
                return Vec::new();
            }
        };

        turns
            .into_iter()
            .rev()
            .flat_map(|turn| {
                [
                    ChatMessage::user(turn.user_message),
                    ChatMessage::assistant(turn.assistant_response),
                ]
            })
            .collect()
    }
}

fn build_system_prompt(
    user_context: Option<&UserContext>,
    matches: &[ContentMatch],
    context_type: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "You are GEOVA, the AI mentor of the Harita Hive platform for geospatial professionals. \
         You help with GIS analysis, remote sensing, spatial data science, QGIS and GeoAI. \
         Give practical, step-by-step answers and include code when it helps.",
    );

    if let Some(context) = user_context {
        prompt.push_str("\n\nLearner profile:");
        if let Some(name) = context.display_name.as_deref() {
            let _ = write!(prompt, "\n- Name: {name}");
        }
        if let Some(title) = context.professional_title.as_deref() {
            let _ = write!(prompt, "\n- Role: {title}");
        }
        if let Some(level) = context.experience_level.as_deref() {
            let _ = write!(prompt, "\n- Experience: {level}");
        }
        let _ = write!(prompt, "\n- Plan: {} ({})", context.tier, context.status);
        if !context.enrolled_courses.is_empty() {
            let _ = write!(prompt, "\n- Enrolled in: {}", context.enrolled_courses.join(", "));
        }
    }

    if !matches.is_empty() {
        prompt.push_str("\n\nRelevant platform content:");
        for matched in matches {
            let _ = write!(prompt, "\n- [{}] {}", matched.source.label(), matched.title);
            if let Some(summary) = matched.summary.as_deref().filter(|s| !s.is_empty()) {
                let _ = write!(prompt, ": {summary}");
            }
        }
    }

    if let Some(context_type) = context_type.filter(|c| !c.is_empty()) {
        let _ = write!(prompt, "\n\nThe learner is asking from the {context_type} area.");
    }

    prompt
}
