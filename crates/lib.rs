pub mod domain;
pub mod infra;
pub mod observability;
pub mod openai;
pub mod session_guardian;
pub mod youtube;
