// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use crate::time_utils::fixed_offset;
use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Arrival threshold used when a project does not carry its own.
pub const DEFAULT_ARRIVAL_THRESHOLD_METERS: u32 = 100;

/// Japan Standard Time, the offset the route sheets are written in.
pub const DEFAULT_LOCAL_UTC_OFFSET_MINUTES: i32 = 9 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Bearer token for the administrative API
    pub admin_token: String,
    /// Google Maps key for the directions API (trace generation only)
    pub directions_api_key: Option<String>,
    /// Geofence radius for projects that do not set one
    pub default_arrival_threshold_meters: u32,
    /// Offset used to render ping timestamps as local `HH:MM`
    pub local_utc_offset_minutes: i32,
    /// Seconds between synthetic pings while parked
    pub trace_interval_secs: u32,
    /// Upper bound on a single directions request
    pub route_request_timeout_secs: u64,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            admin_token: "test_admin_token".to_string(),
            directions_api_key: None,
            default_arrival_threshold_meters: DEFAULT_ARRIVAL_THRESHOLD_METERS,
            local_utc_offset_minutes: DEFAULT_LOCAL_UTC_OFFSET_MINUTES,
            trace_interval_secs: 10,
            route_request_timeout_secs: 20,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Self {
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            admin_token: env::var("ADMIN_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ADMIN_TOKEN"))?,
            directions_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            default_arrival_threshold_meters: parse_var(
                "DEFAULT_ARRIVAL_THRESHOLD_METERS",
                DEFAULT_ARRIVAL_THRESHOLD_METERS,
            )?,
            local_utc_offset_minutes: parse_var(
                "LOCAL_UTC_OFFSET_MINUTES",
                DEFAULT_LOCAL_UTC_OFFSET_MINUTES,
            )?,
            trace_interval_secs: parse_var("TRACE_INTERVAL_SECS", 10)?,
            route_request_timeout_secs: parse_var("ROUTE_REQUEST_TIMEOUT_SECS", 20)?,
        };

        if config.trace_interval_secs == 0 {
            return Err(ConfigError::Invalid("TRACE_INTERVAL_SECS"));
        }
        if fixed_offset(config.local_utc_offset_minutes).is_none() {
            return Err(ConfigError::Invalid("LOCAL_UTC_OFFSET_MINUTES"));
        }

        Ok(config)
    }

    /// The offset local clock times are expressed in.
    pub fn local_offset(&self) -> FixedOffset {
        fixed_offset(self.local_utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }

    pub fn route_request_timeout(&self) -> Duration {
        Duration::from_secs(self.route_request_timeout_secs)
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("ADMIN_TOKEN", "  secret-admin  ");
        env::set_var("DEFAULT_ARRIVAL_THRESHOLD_METERS", "150");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.admin_token, "secret-admin");
        assert_eq!(config.default_arrival_threshold_meters, 150);
        assert_eq!(config.port, 8080);
        assert_eq!(config.local_offset().local_minus_utc(), 9 * 3600);
    }
}
