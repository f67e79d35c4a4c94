pub mod assistant;
pub mod entitlements;
pub mod live_sessions;
pub mod sessions;
pub mod subscriptions;
