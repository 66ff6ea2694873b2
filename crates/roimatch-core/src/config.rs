use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing, values are invalid,
/// or the encrypted database URL cannot be decrypted.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing, values are invalid,
/// or the encrypted database URL cannot be decrypted.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load configuration for commands that never open a database connection.
///
/// Same as [`load_app_config`], except a missing `DATABASE_URL` leaves
/// `database_url` empty instead of failing.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or a configured encrypted
/// database URL cannot be decrypted.
pub fn load_app_config_without_database() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_config(|key| std::env::var(key), DatabaseUrl::Optional)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatabaseUrl {
    Required,
    Optional,
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    build_config(lookup, DatabaseUrl::Required)
}

fn build_config<F>(lookup: F, database: DatabaseUrl) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool_flag(&or_default(var, default))
            .ok_or_else(|| invalid(var, "expected true/false".to_string()))
    };

    let database_url = match resolve_database_url(&lookup) {
        Ok(url) => url,
        Err(ConfigError::MissingEnvVar(_)) if database == DatabaseUrl::Optional => String::new(),
        Err(e) => return Err(e),
    };

    let env_raw = or_default("ROIMATCH_ENV", "development");
    let env = parse_environment(&env_raw).map_err(|reason| invalid("ROIMATCH_ENV", reason))?;

    let bind_addr = parse_addr("ROIMATCH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ROIMATCH_LOG_LEVEL", "info");
    let niches_path = PathBuf::from(or_default("ROIMATCH_NICHES_PATH", "./config/niches.yaml"));
    let roi_model_path = PathBuf::from(or_default(
        "ROIMATCH_ROI_MODEL_PATH",
        "./models/roi_predictor.json",
    ));
    let sales_model_path = PathBuf::from(or_default(
        "ROIMATCH_SALES_MODEL_PATH",
        "./models/sales_predictor.json",
    ));

    let seed = parse_u64("ROIMATCH_SEED", "42")?;
    let simulation_mode = parse_bool("ROIMATCH_SIMULATION_MODE", "true")?;

    let campaign_budget_min = parse_i64("ROIMATCH_CAMPAIGN_BUDGET_MIN", "1000")?;
    let campaign_budget_max = parse_i64("ROIMATCH_CAMPAIGN_BUDGET_MAX", "10000")?;
    if campaign_budget_min <= 0 || campaign_budget_min > campaign_budget_max {
        return Err(invalid(
            "ROIMATCH_CAMPAIGN_BUDGET_MIN",
            format!(
                "budget range must satisfy 0 < min <= max (got {campaign_budget_min}..={campaign_budget_max})"
            ),
        ));
    }

    let synthetic_roi_min = parse_f64("ROIMATCH_SYNTHETIC_ROI_MIN", "5.0")?;
    let synthetic_roi_max = parse_f64("ROIMATCH_SYNTHETIC_ROI_MAX", "15.0")?;
    if synthetic_roi_min >= synthetic_roi_max {
        return Err(invalid(
            "ROIMATCH_SYNTHETIC_ROI_MIN",
            format!("must be less than ROIMATCH_SYNTHETIC_ROI_MAX ({synthetic_roi_max})"),
        ));
    }

    let link_limit = parse_usize("ROIMATCH_LINK_LIMIT", "2000")?;
    let creator_file_limit = parse_usize("ROIMATCH_CREATOR_FILE_LIMIT", "5000")?;
    let campaign_file_limit = parse_usize("ROIMATCH_CAMPAIGN_FILE_LIMIT", "2000")?;

    let default_top_k = parse_usize("ROIMATCH_DEFAULT_TOP_K", "3")?;
    if default_top_k == 0 {
        return Err(invalid(
            "ROIMATCH_DEFAULT_TOP_K",
            "must be at least 1".to_string(),
        ));
    }

    let db_max_connections = parse_u32("ROIMATCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ROIMATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ROIMATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let rate_limit_per_minute = parse_usize("ROIMATCH_RATE_LIMIT_PER_MINUTE", "120")?;
    if rate_limit_per_minute == 0 {
        return Err(invalid(
            "ROIMATCH_RATE_LIMIT_PER_MINUTE",
            "must be at least 1".to_string(),
        ));
    }

    let api_keys = lookup("ROIMATCH_API_KEYS")
        .map(|raw| parse_api_keys(&raw))
        .unwrap_or_default();

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        niches_path,
        roi_model_path,
        sales_model_path,
        seed,
        simulation_mode,
        campaign_budget_min,
        campaign_budget_max,
        synthetic_roi_min,
        synthetic_roi_max,
        link_limit,
        creator_file_limit,
        campaign_file_limit,
        default_top_k,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        rate_limit_per_minute,
        api_keys,
    })
}

/// Pick the database URL: the decrypted `ENCRYPTED_DATABASE_URL` when both it
/// and `ENCRYPTION_KEY` are set, otherwise plaintext `DATABASE_URL`.
fn resolve_database_url<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let encrypted = lookup("ENCRYPTED_DATABASE_URL").ok();
    let key = lookup("ENCRYPTION_KEY").ok();

    match (encrypted, key) {
        (Some(token), Some(key)) => crate::secret::decrypt_fernet(&token, &key),
        (encrypted, key) => {
            if encrypted.is_some() || key.is_some() {
                tracing::warn!(
                    "only one of ENCRYPTED_DATABASE_URL / ENCRYPTION_KEY is set; falling back to DATABASE_URL"
                );
            }
            lookup("DATABASE_URL").map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
        }
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, String> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(format!(
            "unknown environment '{other}'; expected development, test, or production"
        )),
    }
}

fn parse_bool_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
