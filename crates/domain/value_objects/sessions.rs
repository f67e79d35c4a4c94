use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegisterSessionModel {
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionMarkerDto {
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct SessionValidityDto {
    pub valid: bool,
}

/// Body of the validate and revoke calls. The id stays a string so a
/// malformed marker reads as an invalid session rather than a 422.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionIdModel {
    pub session_id: String,
}
