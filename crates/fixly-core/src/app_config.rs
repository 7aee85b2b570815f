use std::path::PathBuf;

use crate::tracking::GeoPoint;

/// Runtime settings for the client stack, read once at startup.
///
/// Every field has a default suitable for a locally running backend, so a
/// bare environment works out of the box.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// REST base, e.g. `http://localhost:5000/api`.
    pub api_base_url: String,
    /// WebSocket endpoint, e.g. `ws://localhost:5000/ws`.
    pub realtime_url: String,
    pub request_timeout_secs: u64,
    /// Bounded wait for a device/fallback location fix.
    pub geolocation_timeout_secs: u64,
    /// How often the tracking worker wakes to consider a reconciliation pull.
    pub poll_interval_secs: u64,
    /// How stale the last push must be before that pull actually happens.
    pub idle_refetch_secs: u64,
    pub reconnect_max_retries: u32,
    pub reconnect_base_ms: u64,
    pub log_level: String,
    /// Where the bearer token is cached between runs.
    pub token_path: PathBuf,
    /// Stand-in for device geolocation; a terminal has no GPS.
    pub fallback_location: Option<GeoPoint>,
}
