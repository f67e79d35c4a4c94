#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub entitlements: Entitlements,
    pub youtube: Youtube,
    pub openai: OpenAi,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Entitlements {
    pub super_admin_email: Option<String>,
    pub override_emails: Vec<String>,
    pub override_days: i64,
}

#[derive(Debug, Clone)]
pub struct Youtube {
    pub api_key: String,
    pub channel_id: Option<String>,
    pub oauth: Option<YoutubeOAuth>,
}

#[derive(Debug, Clone)]
pub struct YoutubeOAuth {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct OpenAi {
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
}
