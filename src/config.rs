// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use std::env;

/// Default Ramadan 1447 window.
const DEFAULT_RAMADAN_START: &str = "2026-03-18";
const DEFAULT_RAMADAN_END: &str = "2026-04-16";
/// Dhaka local time (UTC+6).
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 360;
const DEFAULT_REGION: &str = "Dhaka";

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Document store implementation
    pub store_backend: StoreBackend,
    /// OAuth client ID that Google ID tokens must be issued for.
    /// Google sign-in is disabled when unset.
    pub google_client_id: Option<String>,
    /// Region whose schedule is shown when none is requested
    pub default_region: String,
    /// Regions that have a schedule collection
    pub regions: Vec<String>,
    /// Offset used for "today" and for local clock times in schedules
    pub utc_offset_minutes: i32,
    /// First day of Ramadan
    pub ramadan_start: NaiveDate,
    /// Last day of Ramadan
    pub ramadan_end: NaiveDate,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            google_client_id: None,
            default_region: DEFAULT_REGION.to_string(),
            regions: vec![DEFAULT_REGION.to_string(), "Chittagong".to_string()],
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            ramadan_start: parse_date("RAMADAN_START", DEFAULT_RAMADAN_START)
                .unwrap_or(NaiveDate::MIN),
            ramadan_end: parse_date("RAMADAN_END", DEFAULT_RAMADAN_END).unwrap_or(NaiveDate::MIN),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let default_region =
            env::var("DEFAULT_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let mut regions: Vec<String> = env::var("REGIONS")
            .map(|v| {
                v.split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if !regions.contains(&default_region) {
            regions.insert(0, default_region.clone());
        }

        let utc_offset_minutes = match env::var("UTC_OFFSET_MINUTES") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "UTC_OFFSET_MINUTES",
                value: raw,
            })?,
            Err(_) => DEFAULT_UTC_OFFSET_MINUTES,
        };
        if FixedOffset::east_opt(utc_offset_minutes * 60).is_none() {
            return Err(ConfigError::Invalid {
                name: "UTC_OFFSET_MINUTES",
                value: utc_offset_minutes.to_string(),
            });
        }

        let ramadan_start = parse_date(
            "RAMADAN_START",
            &env::var("RAMADAN_START").unwrap_or_else(|_| DEFAULT_RAMADAN_START.to_string()),
        )?;
        let ramadan_end = parse_date(
            "RAMADAN_END",
            &env::var("RAMADAN_END").unwrap_or_else(|_| DEFAULT_RAMADAN_END.to_string()),
        )?;
        if ramadan_end < ramadan_start {
            return Err(ConfigError::Invalid {
                name: "RAMADAN_END",
                value: ramadan_end.to_string(),
            });
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend,
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            default_region,
            regions,
            utc_offset_minutes,
            ramadan_start,
            ramadan_end,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Local time zone for schedules and the Ramadan calendar.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Check a requested region against the configured list.
    pub fn resolve_region<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        match requested {
            None => Some(self.default_region.as_str()),
            Some(r) => self
                .regions
                .iter()
                .find(|known| known.eq_ignore_ascii_case(r))
                .map(String::as_str),
        }
    }
}

fn parse_date(name: &'static str, raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("STORE_BACKEND", "memory");
        env::set_var("REGIONS", "Chittagong, Sylhet");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.port, 8080);
        assert_eq!(config.regions, vec!["Dhaka", "Chittagong", "Sylhet"]);
        assert_eq!(
            config.ramadan_start,
            NaiveDate::from_ymd_opt(2026, 3, 18).unwrap()
        );
    }

    #[test]
    fn test_resolve_region() {
        let config = Config::test_default();
        assert_eq!(config.resolve_region(None), Some("Dhaka"));
        assert_eq!(config.resolve_region(Some("chittagong")), Some("Chittagong"));
        assert_eq!(config.resolve_region(Some("users")), None);
    }

    #[test]
    fn test_default_offset_is_dhaka() {
        let config = Config::test_default();
        assert_eq!(config.utc_offset().local_minus_utc(), 6 * 3600);
    }
}
