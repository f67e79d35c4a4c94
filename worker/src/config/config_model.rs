use backend::config::config_model::Youtube;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub youtube: Youtube,
    pub live_sync: LiveSync,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct LiveSync {
    pub interval_seconds: u64,
}
