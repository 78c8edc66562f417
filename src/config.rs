//! Runtime configuration from environment variables (and `.env`).

use std::env::VarError;
use std::path::PathBuf;

use thiserror::Error;

use crate::data::DEFAULT_BASE_URL;
use crate::geo::LatLng;
use crate::geolocation::parse_coordinate;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub county: String,
    pub state_file: PathBuf,
    pub log_file: PathBuf,
    /// `EnvFilter` directive string
    pub log_filter: String,
    /// Fixed GPS fix, if any
    pub gps: Option<LatLng>,
    /// Seed for the mock environmental provider
    pub data_seed: u64,
}

/// Load configuration, reading `.env` first if present.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for malformed values.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };
    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let api_base_url = or_default("SEEDMAP_API_BASE_URL", DEFAULT_BASE_URL);
    if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
        return Err(invalid(
            "SEEDMAP_API_BASE_URL",
            "must start with http:// or https://".to_string(),
        ));
    }

    let county = or_default("SEEDMAP_COUNTY", "nandi").trim().to_lowercase();
    if !county.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid(
            "SEEDMAP_COUNTY",
            format!("'{county}' is not a county id"),
        ));
    }

    let state_file = PathBuf::from(or_default("SEEDMAP_STATE_FILE", ".seedmap-session.json"));
    let log_file = PathBuf::from(or_default("SEEDMAP_LOG_FILE", "seedmap.log"));
    let log_filter = or_default("SEEDMAP_LOG", "seedmap=info");

    let gps = match lookup("SEEDMAP_GPS").ok().filter(|v| !v.trim().is_empty()) {
        Some(raw) => Some(parse_coordinate(&raw).map_err(|e| invalid("SEEDMAP_GPS", e.to_string()))?),
        None => None,
    };

    let data_seed = or_default("SEEDMAP_DATA_SEED", "0")
        .parse::<u64>()
        .map_err(|e| invalid("SEEDMAP_DATA_SEED", e.to_string()))?;

    Ok(AppConfig {
        api_base_url,
        county,
        state_file,
        log_file,
        log_filter,
        gps,
        data_seed,
    })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            county: "nandi".to_string(),
            state_file: PathBuf::from(".seedmap-session.json"),
            log_file: PathBuf::from("seedmap.log"),
            log_filter: "seedmap=info".to_string(),
            gps: None,
            data_seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_app_config_defaults() {
        let map = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn build_app_config_reads_overrides() {
        let map = HashMap::from([
            ("SEEDMAP_API_BASE_URL", "http://localhost:8080/api"),
            ("SEEDMAP_COUNTY", " Uasin-Gishu "),
            ("SEEDMAP_GPS", "0.2, 35.1"),
            ("SEEDMAP_DATA_SEED", "42"),
            ("SEEDMAP_LOG", "seedmap=debug"),
        ]);
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.county, "uasin-gishu");
        assert_eq!(config.gps, Some(LatLng::new(0.2, 35.1)));
        assert_eq!(config.data_seed, 42);
        assert_eq!(config.log_filter, "seedmap=debug");
    }

    #[test]
    fn build_app_config_rejects_bad_seed() {
        let map = HashMap::from([("SEEDMAP_DATA_SEED", "many")]);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SEEDMAP_DATA_SEED"),
            "got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_bad_gps() {
        let map = HashMap::from([("SEEDMAP_GPS", "95, 35")]);
        let result = build_app_config(lookup_from_map(&map));
        match result {
            Err(ConfigError::InvalidEnvVar { var, reason }) => {
                assert_eq!(var, "SEEDMAP_GPS");
                assert_eq!(reason, "Latitude must be between -90 and 90");
            }
            other => panic!("expected InvalidEnvVar, got: {other:?}"),
        }
    }

    #[test]
    fn build_app_config_rejects_non_http_base_url() {
        let map = HashMap::from([("SEEDMAP_API_BASE_URL", "ftp://example.com")]);
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }
}
