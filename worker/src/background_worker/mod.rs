pub mod live_sync_worker;
