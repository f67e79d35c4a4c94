use std::collections::HashSet;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::value_objects::live_sessions::{Broadcast, BroadcastListing, VideoDetails};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Queries used when only the public search API is available.
pub const FALLBACK_SEARCH_QUERIES: [&str; 5] = [
    "GIS live class",
    "geospatial webinar",
    "QGIS tutorial",
    "remote sensing",
    "GeoAI",
];

const TOKEN_REFRESH_MARGIN_MINUTES: i64 = 5;
const LIST_PAGE_SIZE: u32 = 25;
const SEARCH_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct YoutubeOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub api_key: String,
    pub channel_id: Option<String>,
    pub oauth: Option<YoutubeOAuthConfig>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BroadcastPhase {
    Live,
    Upcoming,
}

impl BroadcastPhase {
    fn broadcast_status(&self) -> &'static str {
        match self {
            BroadcastPhase::Live => "active",
            BroadcastPhase::Upcoming => "upcoming",
        }
    }

    fn search_event_type(&self) -> &'static str {
        match self {
            BroadcastPhase::Live => "live",
            BroadcastPhase::Upcoming => "upcoming",
        }
    }
}

/// YouTube Data API client. Uses OAuth (liveBroadcasts) when a refresh token is
/// configured and falls back to keyword search with the API key otherwise.
pub struct YoutubeClient {
    http: reqwest::Client,
    config: YoutubeConfig,
    api_base: String,
    token_url: String,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    fn best_url(&self) -> Option<String> {
        [&self.maxres, &self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .find_map(|thumbnail| thumbnail.url.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastSnippet {
    title: Option<String>,
    description: Option<String>,
    thumbnails: Option<Thumbnails>,
    scheduled_start_time: Option<DateTime<Utc>>,
    actual_start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastStatusPart {
    life_cycle_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LiveBroadcastItem {
    id: String,
    snippet: Option<BroadcastSnippet>,
    status: Option<BroadcastStatusPart>,
}

#[derive(Debug, Deserialize)]
struct LiveBroadcastList {
    #[serde(default)]
    items: Vec<LiveBroadcastItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: Option<String>,
    description: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
struct SearchList {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    scheduled_start_time: Option<DateTime<Utc>>,
    actual_start_time: Option<DateTime<Utc>>,
    actual_end_time: Option<DateTime<Utc>>,
    concurrent_viewers: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatusPart {
    upload_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    live_streaming_details: Option<LiveStreamingDetails>,
    status: Option<VideoStatusPart>,
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<VideoItem>,
}

impl From<LiveBroadcastItem> for Broadcast {
    fn from(item: LiveBroadcastItem) -> Self {
        let snippet = item.snippet;
        Broadcast {
            title: snippet
                .as_ref()
                .and_then(|s| s.title.clone())
                .unwrap_or_else(|| "Live Stream".to_string()),
            description: snippet.as_ref().and_then(|s| s.description.clone()),
            thumbnail_url: snippet
                .as_ref()
                .and_then(|s| s.thumbnails.as_ref())
                .and_then(Thumbnails::best_url),
            scheduled_start: snippet.as_ref().and_then(|s| s.scheduled_start_time),
            actual_start: snippet.as_ref().and_then(|s| s.actual_start_time),
            life_cycle_status: item.status.and_then(|s| s.life_cycle_status),
            concurrent_viewers: None,
            broadcast_id: item.id,
        }
    }
}

impl SearchItem {
    fn into_broadcast(self) -> Option<Broadcast> {
        let broadcast_id = self.id.video_id.filter(|id| !id.is_empty())?;
        let snippet = self.snippet;
        Some(Broadcast {
            title: snippet
                .as_ref()
                .and_then(|s| s.title.clone())
                .unwrap_or_else(|| "Live Stream".to_string()),
            description: snippet.as_ref().and_then(|s| s.description.clone()),
            thumbnail_url: snippet
                .as_ref()
                .and_then(|s| s.thumbnails.as_ref())
                .and_then(Thumbnails::best_url),
            scheduled_start: None,
            actual_start: None,
            life_cycle_status: None,
            concurrent_viewers: None,
            broadcast_id,
        })
    }
}

impl From<VideoItem> for VideoDetails {
    fn from(item: VideoItem) -> Self {
        let streaming = item.live_streaming_details;
        VideoDetails {
            title: item.snippet.as_ref().and_then(|s| s.title.clone()),
            thumbnail_url: item
                .snippet
                .as_ref()
                .and_then(|s| s.thumbnails.as_ref())
                .and_then(Thumbnails::best_url),
            scheduled_start: streaming.as_ref().and_then(|s| s.scheduled_start_time),
            actual_start: streaming.as_ref().and_then(|s| s.actual_start_time),
            actual_end: streaming.as_ref().and_then(|s| s.actual_end_time),
            concurrent_viewers: streaming
                .as_ref()
                .and_then(|s| s.concurrent_viewers.as_deref())
                .and_then(|raw| raw.parse::<i32>().ok()),
            life_cycle_status: None,
            upload_status: item.status.and_then(|s| s.upload_status),
            video_id: item.id,
        }
    }
}

fn is_on_air(life_cycle_status: Option<&str>) -> bool {
    matches!(life_cycle_status, Some("live") | Some("liveStarting"))
}

impl YoutubeClient {
    pub fn new(config: YoutubeConfig) -> Result<Self> {
        Self::with_endpoints(config, YOUTUBE_API_BASE, GOOGLE_TOKEN_URL)
    }

    pub fn with_endpoints(config: YoutubeConfig, api_base: &str, token_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(15))
            .build()
            .context("failed to build youtube http client")?;

        Ok(Self {
            http,
            config,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn has_oauth(&self) -> bool {
        self.config.oauth.is_some()
    }

    pub async fn list_live_broadcasts(&self) -> Result<BroadcastListing> {
        self.list_broadcasts(BroadcastPhase::Live).await
    }

    pub async fn list_upcoming_broadcasts(&self) -> Result<BroadcastListing> {
        self.list_broadcasts(BroadcastPhase::Upcoming).await
    }

    pub async fn fetch_video_details(&self, video_id: &str) -> Result<Option<VideoDetails>> {
        let url = format!("{}/videos", self.api_base);
        let mut request = self.http.get(&url).query(&[
            ("part", "snippet,liveStreamingDetails,status"),
            ("id", video_id),
        ]);
        request = match self.access_token().await {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request.query(&[("key", self.config.api_key.as_str())]),
        };

        let resp = Self::ensure_success(request.send().await?, "videos.list").await?;
        let list = resp.json::<VideoList>().await?;
        Ok(list.items.into_iter().next().map(VideoDetails::from))
    }

    async fn list_broadcasts(&self, phase: BroadcastPhase) -> Result<BroadcastListing> {
        if let Some(token) = self.access_token().await {
            match self.list_owned_broadcasts(&token, phase).await {
                Ok(listing) => return Ok(listing),
                Err(OwnedListError::Unauthorized) => {
                    warn!(
                        phase = phase.search_event_type(),
                        "youtube: oauth token rejected; falling back to public search"
                    );
                    self.invalidate_token().await;
                }
                Err(OwnedListError::Other(err)) => return Err(err),
            }
        }

        self.search_public(phase).await
    }

    async fn list_owned_broadcasts(
        &self,
        token: &str,
        phase: BroadcastPhase,
    ) -> std::result::Result<BroadcastListing, OwnedListError> {
        let url = format!("{}/liveBroadcasts", self.api_base);
        let page_size = LIST_PAGE_SIZE.to_string();
        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .query(&[
                ("part", "snippet,status"),
                ("broadcastStatus", phase.broadcast_status()),
                ("broadcastType", "all"),
                ("maxResults", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|err| OwnedListError::Other(err.into()))?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(OwnedListError::Unauthorized);
        }

        let resp = Self::ensure_success(resp, "liveBroadcasts.list")
            .await
            .map_err(OwnedListError::Other)?;
        let list = resp
            .json::<LiveBroadcastList>()
            .await
            .map_err(|err| OwnedListError::Other(err.into()))?;

        let broadcasts = list
            .items
            .into_iter()
            .map(Broadcast::from)
            .filter(|b| phase == BroadcastPhase::Upcoming || is_on_air(b.life_cycle_status.as_deref()))
            .collect::<Vec<_>>();

        debug!(
            phase = phase.search_event_type(),
            count = broadcasts.len(),
            "youtube: owned broadcasts listed"
        );

        Ok(BroadcastListing {
            broadcasts,
            authoritative: true,
        })
    }

    async fn search_public(&self, phase: BroadcastPhase) -> Result<BroadcastListing> {
        let url = format!("{}/search", self.api_base);
        let page_size = SEARCH_PAGE_SIZE.to_string();
        let mut seen = HashSet::new();
        let mut broadcasts = Vec::new();
        let mut failures = 0usize;

        for query in FALLBACK_SEARCH_QUERIES {
            let mut params = vec![
                ("part", "snippet"),
                ("type", "video"),
                ("eventType", phase.search_event_type()),
                ("q", query),
                ("maxResults", page_size.as_str()),
                ("key", self.config.api_key.as_str()),
            ];
            if let Some(channel_id) = self.config.channel_id.as_deref() {
                params.push(("channelId", channel_id));
            }

            let result = async {
                let resp = self.http.get(&url).query(&params).send().await?;
                let resp = Self::ensure_success(resp, "search.list").await?;
                Ok::<_, anyhow::Error>(resp.json::<SearchList>().await?)
            }
            .await;

            match result {
                Ok(list) => {
                    for broadcast in list.items.into_iter().filter_map(SearchItem::into_broadcast) {
                        if seen.insert(broadcast.broadcast_id.clone()) {
                            broadcasts.push(broadcast);
                        }
                    }
                }
                Err(err) => {
                    failures += 1;
                    warn!(query, error = ?err, "youtube: public search query failed");
                }
            }
        }

        if failures == FALLBACK_SEARCH_QUERIES.len() {
            anyhow::bail!("every public search query failed");
        }

        info!(
            phase = phase.search_event_type(),
            count = broadcasts.len(),
            "youtube: public search fallback used"
        );

        Ok(BroadcastListing {
            broadcasts,
            authoritative: false,
        })
    }

    /// Returns a usable bearer token, refreshing it when it is missing or
    /// close to expiry. `None` means public mode.
    async fn access_token(&self) -> Option<String> {
        let oauth = self.config.oauth.as_ref()?;
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::minutes(TOKEN_REFRESH_MARGIN_MINUTES) {
                return Some(token.access_token.clone());
            }
        }

        match self.refresh_access_token(oauth).await {
            Ok(token) => {
                let access_token = token.access_token.clone();
                *cached = Some(token);
                Some(access_token)
            }
            Err(err) => {
                warn!(error = ?err, "youtube: oauth refresh failed; using public search");
                *cached = None;
                None
            }
        }
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn refresh_access_token(&self, oauth: &YoutubeOAuthConfig) -> Result<CachedToken> {
        let form = [
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
            ("refresh_token", oauth.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let resp = self.http.post(&self.token_url).form(&form).send().await?;
        let resp = Self::ensure_success(resp, "oauth token refresh").await?;
        let token = resp.json::<TokenResponse>().await?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in.unwrap_or(3600)),
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "youtube api request failed"
        );

        anyhow::bail!("YouTube API request failed: {} (status {})", context, status);
    }
}

enum OwnedListError {
    Unauthorized,
    Other(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_broadcast_maps_snippet_and_status() {
        let raw = r#"{
            "items": [{
                "id": "abc123",
                "snippet": {
                    "title": "QGIS Live",
                    "description": "Raster basics",
                    "scheduledStartTime": "2026-01-10T10:00:00Z",
                    "thumbnails": {
                        "high": { "url": "https://i.ytimg.com/high.jpg" },
                        "default": { "url": "https://i.ytimg.com/default.jpg" }
                    }
                },
                "status": { "lifeCycleStatus": "live" }
            }]
        }"#;
        let list: LiveBroadcastList = serde_json::from_str(raw).unwrap();
        let broadcast = Broadcast::from(list.items.into_iter().next().unwrap());

        assert_eq!(broadcast.broadcast_id, "abc123");
        assert_eq!(broadcast.title, "QGIS Live");
        assert_eq!(
            broadcast.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/high.jpg")
        );
        assert!(is_on_air(broadcast.life_cycle_status.as_deref()));
        assert!(broadcast.scheduled_start.is_some());
    }

    #[test]
    fn search_items_without_video_id_are_dropped() {
        let raw = r#"{
            "items": [
                { "id": { "kind": "youtube#channel" }, "snippet": { "title": "Channel" } },
                { "id": { "videoId": "v1" } }
            ]
        }"#;
        let list: SearchList = serde_json::from_str(raw).unwrap();
        let broadcasts: Vec<Broadcast> = list
            .items
            .into_iter()
            .filter_map(SearchItem::into_broadcast)
            .collect();

        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].broadcast_id, "v1");
        assert_eq!(broadcasts[0].title, "Live Stream");
    }

    #[test]
    fn video_details_parse_viewers_and_upload_status() {
        let raw = r#"{
            "items": [{
                "id": "v9",
                "snippet": { "title": "Remote sensing 101" },
                "liveStreamingDetails": {
                    "actualStartTime": "2026-01-10T10:02:00Z",
                    "actualEndTime": "2026-01-10T11:30:00Z",
                    "concurrentViewers": "42"
                },
                "status": { "uploadStatus": "processed" }
            }]
        }"#;
        let list: VideoList = serde_json::from_str(raw).unwrap();
        let details = VideoDetails::from(list.items.into_iter().next().unwrap());

        assert_eq!(details.concurrent_viewers, Some(42));
        assert!(details.is_complete());
        assert!(details.is_processed());
    }

    #[test]
    fn unparseable_viewer_count_is_none() {
        let raw = r#"{ "items": [{ "id": "v2", "liveStreamingDetails": { "concurrentViewers": "n/a" } }] }"#;
        let list: VideoList = serde_json::from_str(raw).unwrap();
        let details = VideoDetails::from(list.items.into_iter().next().unwrap());
        assert_eq!(details.concurrent_viewers, None);
        assert!(!details.is_complete());
    }

    #[tokio::test]
    async fn no_oauth_config_means_public_mode() {
        let client = YoutubeClient::new(YoutubeConfig {
            api_key: "key".to_string(),
            channel_id: None,
            oauth: None,
        })
        .unwrap();

        assert!(!client.has_oauth());
        assert_eq!(client.access_token().await, None);
    }
}
