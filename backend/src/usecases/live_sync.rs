use std::{collections::HashSet, sync::Arc};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harita::{
    domain::{
        entities::{live_sessions::UpsertLiveSessionEntity, recordings::UpsertRecordingEntity},
        repositories::{live_sessions::LiveSessionRepository, recordings::RecordingRepository},
        value_objects::{
            enums::live_session_statuses::LiveSessionStatus,
            live_sessions::{
                Broadcast, BroadcastListing, LiveSessionDto, RecordingDto, SyncStats,
                VideoDetails, embed_url, watch_url,
            },
        },
    },
    youtube::youtube_client::YoutubeClient,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

/// Live classes are restricted to the professional plan.
pub const LIVE_SESSION_ACCESS_TIER: &str = "professional";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BroadcastGateway: Send + Sync {
    async fn list_live_broadcasts(&self) -> AnyResult<BroadcastListing>;

    async fn list_upcoming_broadcasts(&self) -> AnyResult<BroadcastListing>;

    async fn fetch_video_details(&self, video_id: &str) -> AnyResult<Option<VideoDetails>>;
}

#[async_trait]
impl BroadcastGateway for YoutubeClient {
    async fn list_live_broadcasts(&self) -> AnyResult<BroadcastListing> {
        self.list_live_broadcasts().await
    }

    async fn list_upcoming_broadcasts(&self) -> AnyResult<BroadcastListing> {
        self.list_upcoming_broadcasts().await
    }

    async fn fetch_video_details(&self, video_id: &str) -> AnyResult<Option<VideoDetails>> {
        self.fetch_video_details(video_id).await
    }
}

#[derive(Debug, Error)]
pub enum LiveSyncError {
    #[error("video platform request failed")]
    Upstream(#[source] anyhow::Error),
    #[error("enterprise access is required")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LiveSyncError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            LiveSyncError::Upstream(_) => StatusCode::BAD_GATEWAY,
            LiveSyncError::Forbidden => StatusCode::FORBIDDEN,
            LiveSyncError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, LiveSyncError>;

#[derive(Debug, Serialize)]
pub struct StageReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SyncStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageReport {
    fn from_outcome(stage: &str, outcome: UseCaseResult<SyncStats>) -> Self {
        match outcome {
            Ok(stats) => Self {
                ok: true,
                stats: Some(stats),
                error: None,
            },
            Err(err) => {
                error!(stage, error = ?err, "live_sync: stage failed");
                Self {
                    ok: false,
                    stats: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LiveSyncReport {
    pub live: StageReport,
    pub upcoming: StageReport,
    pub recordings: StageReport,
}

impl LiveSyncReport {
    pub fn all_ok(&self) -> bool {
        self.live.ok && self.upcoming.ok && self.recordings.ok
    }
}

pub struct LiveSyncUseCase<L, R, B>
where
    L: LiveSessionRepository + Send + Sync + 'static,
    R: RecordingRepository + Send + Sync + 'static,
    B: BroadcastGateway + 'static,
{
    live_repo: Arc<L>,
    recording_repo: Arc<R>,
    gateway: Arc<B>,
}

impl<L, R, B> LiveSyncUseCase<L, R, B>
where
    L: LiveSessionRepository + Send + Sync + 'static,
    R: RecordingRepository + Send + Sync + 'static,
    B: BroadcastGateway + 'static,
{
    pub fn new(live_repo: Arc<L>, recording_repo: Arc<R>, gateway: Arc<B>) -> Self {
        Self {
            live_repo,
            recording_repo,
            gateway,
        }
    }

    /// Runs every stage; a failing stage never stops the others.
    pub async fn run_all(&self) -> LiveSyncReport {
        let live = StageReport::from_outcome("live", self.sync_live().await);
        let upcoming = StageReport::from_outcome("upcoming", self.sync_upcoming().await);
        let recordings = StageReport::from_outcome("recordings", self.sync_recordings().await);

        LiveSyncReport {
            live,
            upcoming,
            recordings,
        }
    }

    pub async fn sync_live(&self) -> UseCaseResult<SyncStats> {
        let listing = self
            .gateway
            .list_live_broadcasts()
            .await
            .map_err(LiveSyncError::Upstream)?;
        let now = Utc::now();
        let mut stats = SyncStats {
            seen: listing.broadcasts.len(),
            ..SyncStats::default()
        };
        let mut listed = HashSet::new();

        for broadcast in &listing.broadcasts {
            listed.insert(broadcast.broadcast_id.clone());

            let details = match self
                .gateway
                .fetch_video_details(&broadcast.broadcast_id)
                .await
            {
                Ok(details) => details,
                Err(err) => {
                    warn!(
                        broadcast_id = %broadcast.broadcast_id,
                        error = ?err,
                        "live_sync: video details lookup failed; skipping broadcast"
                    );
                    stats.failed += 1;
                    continue;
                }
            };

            let status = if details.as_ref().is_some_and(VideoDetails::is_complete) {
                LiveSessionStatus::Ended
            } else {
                LiveSessionStatus::Live
            };
            let entity = session_entity(broadcast, details.as_ref(), status, now);

            match self.live_repo.upsert(entity).await {
                Ok(_) => {
                    stats.upserted += 1;
                    if status == LiveSessionStatus::Ended {
                        stats.ended += 1;
                    }
                }
                Err(err) => {
                    error!(
                        broadcast_id = %broadcast.broadcast_id,
                        error = ?err,
                        "live_sync: failed to upsert live session"
                    );
                    stats.failed += 1;
                }
            }
        }

        // Only a complete listing proves a session is no longer on air.
        if listing.authoritative {
            for session in self.live_repo.list_live().await? {
                if listed.contains(&session.stream_key) {
                    continue;
                }
                match self.live_repo.mark_ended(session.id, now).await {
                    Ok(()) => stats.ended += 1,
                    Err(err) => {
                        error!(
                            broadcast_id = %session.stream_key,
                            error = ?err,
                            "live_sync: failed to end vanished live session"
                        );
                        stats.failed += 1;
                    }
                }
            }
        }

        info!(
            seen = stats.seen,
            upserted = stats.upserted,
            ended = stats.ended,
            failed = stats.failed,
            authoritative = listing.authoritative,
            "live_sync: live stage complete"
        );
        Ok(stats)
    }

    pub async fn sync_upcoming(&self) -> UseCaseResult<SyncStats> {
        let listing = self
            .gateway
            .list_upcoming_broadcasts()
            .await
            .map_err(LiveSyncError::Upstream)?;
        let now = Utc::now();
        let mut stats = SyncStats {
            seen: listing.broadcasts.len(),
            ..SyncStats::default()
        };

        for broadcast in &listing.broadcasts {
            match self
                .live_repo
                .find_by_broadcast_id(&broadcast.broadcast_id)
                .await
            {
                Ok(Some(existing)) if LiveSessionStatus::from_str(&existing.status).has_started() => {
                    stats.skipped += 1;
                    continue;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        broadcast_id = %broadcast.broadcast_id,
                        error = ?err,
                        "live_sync: lookup before scheduling failed"
                    );
                    stats.failed += 1;
                    continue;
                }
            }

            let entity = session_entity(broadcast, None, LiveSessionStatus::Scheduled, now);
            match self.live_repo.upsert_scheduled(entity).await {
                Ok(Some(_)) => stats.upserted += 1,
                // Started between the read and the write.
                Ok(None) => stats.skipped += 1,
                Err(err) => {
                    error!(
                        broadcast_id = %broadcast.broadcast_id,
                        error = ?err,
                        "live_sync: failed to upsert scheduled session"
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(
            seen = stats.seen,
            upserted = stats.upserted,
            skipped = stats.skipped,
            failed = stats.failed,
            "live_sync: upcoming stage complete"
        );
        Ok(stats)
    }

    pub async fn sync_recordings(&self) -> UseCaseResult<SyncStats> {
        let candidates = self.live_repo.list_without_recording().await?;
        let now = Utc::now();
        let mut stats = SyncStats {
            seen: candidates.len(),
            ..SyncStats::default()
        };

        for session in candidates {
            let details = match self.gateway.fetch_video_details(&session.stream_key).await {
                Ok(Some(details)) => details,
                Ok(None) => {
                    stats.skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(
                        broadcast_id = %session.stream_key,
                        error = ?err,
                        "live_sync: video details lookup failed; recording check skipped"
                    );
                    stats.failed += 1;
                    continue;
                }
            };

            if !(details.is_complete() && details.is_processed()) {
                stats.skipped += 1;
                continue;
            }

            let recording = UpsertRecordingEntity {
                stream_key: session.stream_key.clone(),
                live_class_id: Some(session.id),
                title: details.title.clone().unwrap_or_else(|| session.title.clone()),
                video_url: watch_url(&session.stream_key),
                thumbnail_url: details
                    .thumbnail_url
                    .clone()
                    .or_else(|| session.thumbnail_url.clone()),
                recorded_at: details.actual_start.or(session.actual_start_time),
                updated_at: now,
            };

            let recording_id = match self.recording_repo.upsert_by_broadcast_id(recording).await {
                Ok(id) => id,
                Err(err) => {
                    error!(
                        broadcast_id = %session.stream_key,
                        error = ?err,
                        "live_sync: failed to upsert recording"
                    );
                    stats.failed += 1;
                    continue;
                }
            };

            let ended_at = details.actual_end.or(session.end_time).unwrap_or(now);
            if let Err(err) = self
                .live_repo
                .attach_recording(session.id, recording_id, ended_at)
                .await
            {
                error!(
                    broadcast_id = %session.stream_key,
                    %recording_id,
                    error = ?err,
                    "live_sync: failed to link recording to session"
                );
                stats.failed += 1;
                continue;
            }

            stats.upserted += 1;
            stats.ended += 1;
        }

        info!(
            seen = stats.seen,
            recorded = stats.upserted,
            skipped = stats.skipped,
            failed = stats.failed,
            "live_sync: recordings stage complete"
        );
        Ok(stats)
    }

    pub async fn recent_sessions(&self, limit: i64) -> UseCaseResult<Vec<LiveSessionDto>> {
        let sessions = self.live_repo.list_recent(limit).await?;
        Ok(sessions.into_iter().map(LiveSessionDto::from).collect())
    }

    pub async fn recent_recordings(&self, limit: i64) -> UseCaseResult<Vec<RecordingDto>> {
        let recordings = self.recording_repo.list_recent(limit).await?;
        Ok(recordings.into_iter().map(RecordingDto::from).collect())
    }
}

fn session_entity(
    broadcast: &Broadcast,
    details: Option<&VideoDetails>,
    status: LiveSessionStatus,
    now: DateTime<Utc>,
) -> UpsertLiveSessionEntity {
    let started = status.has_started();
    let actual_start = details
        .and_then(|d| d.actual_start)
        .or(broadcast.actual_start)
        .or(started.then_some(now));
    let end_time = match status {
        LiveSessionStatus::Ended => details.and_then(|d| d.actual_end).or(Some(now)),
        _ => None,
    };

    UpsertLiveSessionEntity {
        stream_key: broadcast.broadcast_id.clone(),
        title: broadcast.title.clone(),
        description: broadcast.description.clone(),
        status: status.as_str().to_string(),
        scheduled_start_time: broadcast
            .scheduled_start
            .or_else(|| details.and_then(|d| d.scheduled_start)),
        actual_start_time: if started { actual_start } else { None },
        end_time,
        viewer_count: details
            .and_then(|d| d.concurrent_viewers)
            .or(broadcast.concurrent_viewers)
            .unwrap_or(0),
        thumbnail_url: broadcast
            .thumbnail_url
            .clone()
            .or_else(|| details.and_then(|d| d.thumbnail_url.clone())),
        youtube_url: watch_url(&broadcast.broadcast_id),
        embed_url: embed_url(&broadcast.broadcast_id),
        access_tier: LIVE_SESSION_ACCESS_TIER.to_string(),
        updated_at: now,
    }
}
