pub mod app_config;
pub mod config;
pub mod domain;
pub mod error;
pub mod niches;
pub mod platform;
pub mod secret;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, load_app_config_without_database};
pub use domain::{
    Campaign, Candidate, Creator, HistoricalFilter, Match, MatchMethod, MatchOutcome,
    PerformanceRecord, Recommendation,
};
pub use error::{ConfigError, CoreError};
pub use niches::{load_niches, NicheConfig, NichesFile};
pub use platform::{Platform, Tier};
