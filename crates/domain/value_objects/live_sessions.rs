use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::{live_sessions::LiveSessionEntity, recordings::RecordingEntity},
    value_objects::enums::live_session_statuses::LiveSessionStatus,
};

/// A broadcast as listed by the video platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub broadcast_id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    /// `lifeCycleStatus` when known (OAuth listings only).
    pub life_cycle_status: Option<String>,
    pub concurrent_viewers: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct BroadcastListing {
    pub broadcasts: Vec<Broadcast>,
    /// True when the listing covers every broadcast of the channel, so
    /// absence from it is meaningful.
    pub authoritative: bool,
}

/// Per-video details from `videos.list`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub concurrent_viewers: Option<i32>,
    pub life_cycle_status: Option<String>,
    pub upload_status: Option<String>,
}

impl VideoDetails {
    pub fn is_complete(&self) -> bool {
        self.actual_end.is_some() || self.life_cycle_status.as_deref() == Some("complete")
    }

    pub fn is_processed(&self) -> bool {
        self.upload_status.as_deref() == Some("processed")
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

pub fn embed_url(video_id: &str) -> String {
    format!(
        "https://www.youtube-nocookie.com/embed/{video_id}?autoplay=0&modestbranding=1&rel=0&controls=1"
    )
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SyncStats {
    pub seen: usize,
    pub upserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub ended: usize,
}

#[derive(Debug, Serialize)]
pub struct LiveSessionDto {
    pub id: Uuid,
    pub broadcast_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: LiveSessionStatus,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub viewer_count: i32,
    pub thumbnail_url: Option<String>,
    pub youtube_url: String,
    pub embed_url: String,
    pub access_tier: String,
    pub recording_id: Option<Uuid>,
}

impl From<LiveSessionEntity> for LiveSessionDto {
    fn from(value: LiveSessionEntity) -> Self {
        Self {
            id: value.id,
            broadcast_id: value.stream_key,
            title: value.title,
            description: value.description,
            status: LiveSessionStatus::from_str(&value.status),
            scheduled_start_time: value.scheduled_start_time,
            actual_start_time: value.actual_start_time,
            end_time: value.end_time,
            viewer_count: value.viewer_count,
            thumbnail_url: value.thumbnail_url,
            youtube_url: value.youtube_url,
            embed_url: value.embed_url,
            access_tier: value.access_tier,
            recording_id: value.recording_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordingDto {
    pub id: Uuid,
    pub broadcast_id: String,
    pub live_session_id: Option<Uuid>,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl From<RecordingEntity> for RecordingDto {
    fn from(value: RecordingEntity) -> Self {
        Self {
            id: value.id,
            broadcast_id: value.stream_key,
            live_session_id: value.live_class_id,
            title: value.title,
            video_url: value.video_url,
            thumbnail_url: value.thumbnail_url,
            recorded_at: value.recorded_at,
        }
    }
}
