pub mod assistant_context;
pub mod conversations;
pub mod live_sessions;
pub mod premium_content;
pub mod recordings;
pub mod subscriptions;
pub mod user_sessions;
