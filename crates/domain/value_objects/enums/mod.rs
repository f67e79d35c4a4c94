pub mod content_tiers;
pub mod conversation_intents;
pub mod live_session_statuses;
pub mod subscription_statuses;
pub mod subscription_tiers;
