use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub niches_path: PathBuf,
    pub roi_model_path: PathBuf,
    pub sales_model_path: PathBuf,
    pub seed: u64,
    pub simulation_mode: bool,
    pub campaign_budget_min: i64,
    pub campaign_budget_max: i64,
    pub synthetic_roi_min: f64,
    pub synthetic_roi_max: f64,
    pub link_limit: usize,
    pub creator_file_limit: usize,
    pub campaign_file_limit: usize,
    pub default_top_k: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Requests each API client may make per minute.
    pub rate_limit_per_minute: usize,
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("niches_path", &self.niches_path)
            .field("roi_model_path", &self.roi_model_path)
            .field("sales_model_path", &self.sales_model_path)
            .field("database_url", &"[redacted]")
            .field("seed", &self.seed)
            .field("simulation_mode", &self.simulation_mode)
            .field("campaign_budget_min", &self.campaign_budget_min)
            .field("campaign_budget_max", &self.campaign_budget_max)
            .field("synthetic_roi_min", &self.synthetic_roi_min)
            .field("synthetic_roi_max", &self.synthetic_roi_max)
            .field("link_limit", &self.link_limit)
            .field("creator_file_limit", &self.creator_file_limit)
            .field("campaign_file_limit", &self.campaign_file_limit)
            .field("default_top_k", &self.default_top_k)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
