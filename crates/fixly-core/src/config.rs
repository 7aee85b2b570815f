use std::path::PathBuf;

use thiserror::Error;

use crate::app_config::AppConfig;
use crate::tracking::GeoPoint;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if an env var holds a value that does not parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if an env var holds a value that does not parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing logic is decoupled from the actual environment so tests can
/// drive it with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_base_url = or_default("FIXLY_API_BASE_URL", "http://localhost:5000/api");
    let realtime_url = or_default("FIXLY_REALTIME_URL", "ws://localhost:5000/ws");

    let request_timeout_secs = parse_u64("FIXLY_REQUEST_TIMEOUT_SECS", "30")?;
    let geolocation_timeout_secs = parse_u64("FIXLY_GEOLOCATION_TIMEOUT_SECS", "10")?;
    let poll_interval_secs = parse_u64("FIXLY_POLL_INTERVAL_SECS", "10")?;
    let idle_refetch_secs = parse_u64("FIXLY_IDLE_REFETCH_SECS", "30")?;
    let reconnect_max_retries = parse_u32("FIXLY_RECONNECT_MAX_RETRIES", "5")?;
    let reconnect_base_ms = parse_u64("FIXLY_RECONNECT_BASE_MS", "500")?;

    let log_level = or_default("FIXLY_LOG_LEVEL", "info");
    let token_path = PathBuf::from(or_default("FIXLY_TOKEN_PATH", "./.fixly-token"));

    let fallback_location = match lookup("FIXLY_FALLBACK_LOCATION") {
        Ok(raw) => Some(parse_geo_point(&raw).map_err(|reason| {
            ConfigError::InvalidEnvVar {
                var: "FIXLY_FALLBACK_LOCATION".to_string(),
                reason,
            }
        })?),
        Err(_) => None,
    };

    Ok(AppConfig {
        api_base_url,
        realtime_url,
        request_timeout_secs,
        geolocation_timeout_secs,
        poll_interval_secs,
        idle_refetch_secs,
        reconnect_max_retries,
        reconnect_base_ms,
        log_level,
        token_path,
        fallback_location,
    })
}

/// Parse a `"lat,lng"` pair, e.g. `"12.9716,77.5946"`.
fn parse_geo_point(raw: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {raw:?}"))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("latitude: {e}"))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} out of range"));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!("longitude {lng} out of range"));
    }
    Ok(GeoPoint { lat, lng })
}
