pub mod auth_gateway;
pub mod guardian;
pub mod state;

pub use auth_gateway::{AuthGateway, HttpAuthGateway};
pub use guardian::SessionGuardian;
pub use state::{
    AuthEndpoints, AuthTokens, GuardianConfig, ProbeOutcome, SessionNotice, SessionState,
    SignedInUser,
};
