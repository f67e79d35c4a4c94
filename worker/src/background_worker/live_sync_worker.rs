use backend::usecases::live_sync::{
    BroadcastGateway, LiveSyncReport, LiveSyncUseCase, StageReport,
};
use harita::domain::repositories::{
    live_sessions::LiveSessionRepository, recordings::RecordingRepository,
};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

/// Runs every stage on a fixed cadence. A failed pass is logged and the
/// next one starts after the usual interval.
pub async fn run<L, R, B>(
    usecase: Arc<LiveSyncUseCase<L, R, B>>,
    interval: Duration,
) -> anyhow::Result<()>
where
    L: LiveSessionRepository + Send + Sync + 'static,
    R: RecordingRepository + Send + Sync + 'static,
    B: BroadcastGateway + 'static,
{
    info!(interval_secs = interval.as_secs(), "live_sync: starting worker loop");
    loop {
        run_once(&usecase).await;
        tokio::time::sleep(interval).await;
    }
}

pub async fn run_once<L, R, B>(usecase: &LiveSyncUseCase<L, R, B>) -> LiveSyncReport
where
    L: LiveSessionRepository + Send + Sync + 'static,
    R: RecordingRepository + Send + Sync + 'static,
    B: BroadcastGateway + 'static,
{
    let report = usecase.run_all().await;
    if report.all_ok() {
        info!(
            live_upserted = upserted(&report.live),
            upcoming_upserted = upserted(&report.upcoming),
            recorded = upserted(&report.recordings),
            "live_sync: pass complete"
        );
    } else {
        warn!(
            live_ok = report.live.ok,
            upcoming_ok = report.upcoming.ok,
            recordings_ok = report.recordings.ok,
            "live_sync: pass finished with failed stages"
        );
    }
    report
}

fn upserted(stage: &StageReport) -> usize {
    stage.stats.as_ref().map_or(0, |stats| stats.upserted)
}
