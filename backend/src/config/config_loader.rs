use anyhow::{Context, Result};
use harita::{
    domain::policies::entitlement_overrides::DEFAULT_GRANDFATHERED_DAYS,
    youtube::youtube_client::{YoutubeConfig, YoutubeOAuthConfig},
};

use super::config_model::{
    BackendServer, Database, DotEnvyConfig, Entitlements, OpenAi, Supabase, Youtube, YoutubeOAuth,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let supabase = Supabase {
        jwt_secret: get_jwt_secret()?,
    };

    let entitlements = Entitlements {
        super_admin_email: optional("SUPER_ADMIN_EMAIL"),
        override_emails: optional("ENTITLEMENT_OVERRIDE_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default(),
        override_days: match optional("ENTITLEMENT_OVERRIDE_DAYS") {
            Some(raw) => raw.parse().context("ENTITLEMENT_OVERRIDE_DAYS is invalid")?,
            None => DEFAULT_GRANDFATHERED_DAYS,
        },
    };

    let openai = OpenAi {
        api_key: required("OPENAI_API_KEY")?,
        model: optional("OPENAI_MODEL"),
        base_url: optional("OPENAI_BASE_URL"),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        entitlements,
        youtube: load_youtube()?,
        openai,
    })
}

/// YouTube settings shared with the worker. OAuth mode needs all three
/// OAuth variables; anything less means public search.
pub fn load_youtube() -> Result<Youtube> {
    dotenvy::dotenv().ok();

    let oauth = match (
        optional("YOUTUBE_CLIENT_ID"),
        optional("YOUTUBE_CLIENT_SECRET"),
        optional("YOUTUBE_REFRESH_TOKEN"),
    ) {
        (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(YoutubeOAuth {
            client_id,
            client_secret,
            refresh_token,
        }),
        _ => None,
    };

    Ok(Youtube {
        api_key: required("YOUTUBE_API_KEY")?,
        channel_id: optional("YOUTUBE_CHANNEL_ID"),
        oauth,
    })
}

pub fn get_jwt_secret() -> Result<String> {
    required("SUPABASE_JWT_SECRET")
}

impl From<&Youtube> for YoutubeConfig {
    fn from(value: &Youtube) -> Self {
        YoutubeConfig {
            api_key: value.api_key.clone(),
            channel_id: value.channel_id.clone(),
            oauth: value.oauth.as_ref().map(|oauth| YoutubeOAuthConfig {
                client_id: oauth.client_id.clone(),
                client_secret: oauth.client_secret.clone(),
                refresh_token: oauth.refresh_token.clone(),
            }),
        }
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is invalid"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_list_skips_blanks() {
        assert_eq!(
            parse_email_list(" a@example.com, ,B@example.com ,"),
            vec!["a@example.com".to_string(), "B@example.com".to_string()]
        );
    }
}
