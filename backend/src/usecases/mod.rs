pub mod assistant;
pub mod entitlements;
pub mod live_sync;
pub mod subscriptions;
pub mod user_sessions;
