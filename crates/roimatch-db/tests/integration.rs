//! Offline tests for roimatch-db pool configuration and row conversions.
//! These tests do not require a live database connection.

use chrono::Utc;
use roimatch_core::{AppConfig, Creator, Environment, Match, MatchMethod, Platform};
use roimatch_db::{CreatorRow, DbError, MatchRow, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        niches_path: PathBuf::from("./config/niches.yaml"),
        roi_model_path: PathBuf::from("./models/roi_predictor.json"),
        sales_model_path: PathBuf::from("./models/sales_predictor.json"),
        seed: 42,
        simulation_mode: true,
        campaign_budget_min: 1000,
        campaign_budget_max: 10_000,
        synthetic_roi_min: 5.0,
        synthetic_roi_max: 15.0,
        link_limit: 2000,
        creator_file_limit: 5000,
        campaign_file_limit: 2000,
        default_top_k: 3,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        rate_limit_per_minute: 120,
        api_keys: vec![],
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn creator_row_converts_to_domain() {
    let row = CreatorRow {
        creator_id: 7,
        username: "glowup".to_string(),
        follower_count: 1234,
        niche: "Beauty".to_string(),
        platform: "YouTube".to_string(),
        bio: "skin".to_string(),
        created_at: Utc::now(),
    };
    let c = Creator::try_from(row).unwrap();
    assert_eq!(c.id, 7);
    assert_eq!(c.follower_count, 1234);
    assert_eq!(c.platform, Platform::YouTube);
}

#[test]
fn creator_row_with_unknown_platform_is_invalid() {
    let row = CreatorRow {
        creator_id: 1,
        username: "x".to_string(),
        follower_count: 1,
        niche: "Beauty".to_string(),
        platform: "Friendster".to_string(),
        bio: String::new(),
        created_at: Utc::now(),
    };
    assert!(matches!(Creator::try_from(row), Err(DbError::InvalidRow(_))));
}

#[test]
fn creator_row_with_negative_followers_is_invalid() {
    let row = CreatorRow {
        creator_id: 1,
        username: "x".to_string(),
        follower_count: -5,
        niche: "Beauty".to_string(),
        platform: "TikTok".to_string(),
        bio: String::new(),
        created_at: Utc::now(),
    };
    assert!(matches!(Creator::try_from(row), Err(DbError::InvalidRow(_))));
}

#[test]
fn match_row_parses_method_and_outcome() {
    let row = MatchRow {
        match_id: 3,
        creator_id: 9,
        match_method: "observed".to_string(),
        actual_roi: 11.5,
        outcome: "completed".to_string(),
        created_at: Utc::now(),
    };
    let m = Match::try_from(row).unwrap();
    assert_eq!(m.id, 3);
    assert_eq!(m.method, MatchMethod::Observed);

    let bad = MatchRow {
        match_id: 4,
        creator_id: 9,
        match_method: "guessed".to_string(),
        actual_roi: 1.0,
        outcome: "completed".to_string(),
        created_at: Utc::now(),
    };
    assert!(Match::try_from(bad).is_err());
}
