use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier,
};

pub const FALLBACK_RESPONSE: &str =
    "I'm having trouble answering right now. Please try again in a moment.";

pub const HISTORY_TURN_LIMIT: i64 = 10;
pub const CONTEXT_MATCH_LIMIT: usize = 5;
pub const KEYWORD_LIMIT: usize = 5;

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "could", "does", "from", "have", "help", "into",
    "just", "like", "make", "need", "please", "should", "some", "than", "that", "their", "them",
    "then", "there", "these", "they", "this", "using", "want", "what", "when", "where", "which",
    "will", "with", "would", "your",
];

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<Uuid>,
    pub context_type: Option<String>,
}

/// Searchable content tables, in tie-break order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    CodeSnippet,
    Template,
    Tool,
}

impl ContentSource {
    pub fn weight(&self) -> f32 {
        match self {
            ContentSource::CodeSnippet => 0.8,
            ContentSource::Template => 0.7,
            ContentSource::Tool => 0.6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentSource::CodeSnippet => "Code snippet",
            ContentSource::Template => "Project template",
            ContentSource::Tool => "GIS tool",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentMatch {
    pub source: ContentSource,
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub relevance: f32,
}

impl ContentMatch {
    pub fn new(source: ContentSource, id: Uuid, title: String, summary: Option<String>) -> Self {
        Self {
            source,
            id,
            title,
            summary,
            relevance: source.weight(),
        }
    }
}

/// Orders matches by relevance, keeping source order for ties.
pub fn rank_matches(mut matches: Vec<ContentMatch>, limit: usize) -> Vec<ContentMatch> {
    // sort_by is stable, so equal weights keep their insertion order.
    matches.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    matches.truncate(limit);
    matches
}

pub fn extract_keywords(message: &str, limit: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in message
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() > 3)
    {
        if STOP_WORDS.contains(&word.as_str()) || keywords.contains(&word) {
            continue;
        }
        keywords.push(word);
        if keywords.len() == limit {
            break;
        }
    }
    keywords
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserContext {
    pub display_name: Option<String>,
    pub professional_title: Option<String>,
    pub experience_level: Option<String>,
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub enrolled_courses: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SuggestedAction {
    pub action_type: &'static str,
    pub label: &'static str,
}

pub fn suggested_actions(message: &str) -> Vec<SuggestedAction> {
    let lower = message.to_lowercase();
    let has_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
    let mut actions = Vec::new();

    if has_any(&["sentinel", "landsat", "satellite", "dataset"]) {
        actions.push(SuggestedAction {
            action_type: "browse_datasets",
            label: "Browse open datasets",
        });
    }
    if has_any(&["code", "script", "python", "example"]) {
        actions.push(SuggestedAction {
            action_type: "code_example",
            label: "Show a code example",
        });
    }
    if has_any(&["learn", "course", "roadmap", "beginner"]) {
        actions.push(SuggestedAction {
            action_type: "open_learning_path",
            label: "Open a learning path",
        });
    }
    if has_any(&["tool", "plugin", "qgis", "software"]) {
        actions.push(SuggestedAction {
            action_type: "find_tools",
            label: "Find GIS tools",
        });
    }
    actions
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssistantErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub conversation_id: Uuid,
    pub response: String,
    pub suggested_actions: Vec<SuggestedAction>,
    pub context_used: Vec<ContentMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AssistantErrorBody>,
}

impl AssistantReply {
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(source: ContentSource, title: &str) -> ContentMatch {
        ContentMatch::new(source, Uuid::new_v4(), title.to_string(), None)
    }

    #[test]
    fn ranks_by_source_weight_and_keeps_ties_in_order() {
        let ranked = rank_matches(
            vec![
                matched(ContentSource::Tool, "tool-a"),
                matched(ContentSource::Template, "template-a"),
                matched(ContentSource::CodeSnippet, "snippet-a"),
                matched(ContentSource::CodeSnippet, "snippet-b"),
            ],
            3,
        );
        let titles: Vec<&str> = ranked.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["snippet-a", "snippet-b", "template-a"]);
    }

    #[test]
    fn keywords_skip_short_and_stop_words() {
        let keywords = extract_keywords("How do I clip a raster with a shapefile in QGIS? raster", 5);
        assert_eq!(keywords, vec!["clip", "raster", "shapefile", "qgis"]);
    }

    #[test]
    fn keywords_respect_limit() {
        let keywords = extract_keywords("buffer dissolve intersect union reproject merge", 3);
        assert_eq!(keywords, vec!["buffer", "dissolve", "intersect"]);
    }

    #[test]
    fn suggests_actions_from_message() {
        let actions = suggested_actions("Python script to download Sentinel imagery");
        let kinds: Vec<&str> = actions.iter().map(|a| a.action_type).collect();
        assert_eq!(kinds, vec!["browse_datasets", "code_example"]);
        assert!(suggested_actions("hello").is_empty());
    }
}
