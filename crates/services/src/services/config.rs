//! Runtime configuration, read from `GYM_*` environment variables.

use std::{net::SocketAddr, time::Duration};

use chrono::{FixedOffset, Offset, Utc};
use secrecy::SecretString;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use url::Url;

use super::completers::DEFAULT_MAX_COUNT;

const DEFAULT_BIND: &str = "127.0.0.1:3001";
const DEFAULT_DATABASE_URL: &str = "sqlite://gym.db?mode=rwc";
const DEFAULT_REST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DataSourceKind {
    Sqlite,
    Rest,
}

/// Hosted backend credentials
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: Url,
    pub api_key: SecretString,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum DataSource {
    Sqlite { database_url: String },
    Rest(RestConfig),
}

impl DataSource {
    pub fn kind(&self) -> DataSourceKind {
        match self {
            DataSource::Sqlite { .. } => DataSourceKind::Sqlite,
            DataSource::Rest(_) => DataSourceKind::Rest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub data_source: DataSource,
    /// Offset used to decide which calendar day "today" is.
    pub utc_offset: FixedOffset,
    pub leaderboard_size: usize,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("GYM_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("GYM_BIND", &bind_raw, e))?;

        let kind_raw = get("GYM_DATA_SOURCE").unwrap_or_else(|| DataSourceKind::Sqlite.to_string());
        let kind = kind_raw
            .parse::<DataSourceKind>()
            .map_err(|e| invalid("GYM_DATA_SOURCE", &kind_raw, e))?;

        let data_source = match kind {
            DataSourceKind::Sqlite => DataSource::Sqlite {
                database_url: get("GYM_DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
            DataSourceKind::Rest => {
                let url_raw = get("GYM_REST_URL").ok_or(ConfigError::Missing("GYM_REST_URL"))?;
                let base_url =
                    Url::parse(&url_raw).map_err(|e| invalid("GYM_REST_URL", &url_raw, e))?;
                let api_key =
                    get("GYM_REST_API_KEY").ok_or(ConfigError::Missing("GYM_REST_API_KEY"))?;
                let timeout_secs = match get("GYM_REST_TIMEOUT_SECS") {
                    Some(raw) => raw
                        .parse::<u64>()
                        .map_err(|e| invalid("GYM_REST_TIMEOUT_SECS", &raw, e))?,
                    None => DEFAULT_REST_TIMEOUT_SECS,
                };
                DataSource::Rest(RestConfig {
                    base_url,
                    api_key: SecretString::from(api_key),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
        };

        let utc_offset = match get("GYM_UTC_OFFSET") {
            Some(raw) => parse_offset(&raw)?,
            None => utc(),
        };

        let leaderboard_size = match get("GYM_LEADERBOARD_SIZE") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => return Err(invalid("GYM_LEADERBOARD_SIZE", &raw, "must be positive")),
                Ok(n) => n,
                Err(e) => return Err(invalid("GYM_LEADERBOARD_SIZE", &raw, e)),
            },
            None => DEFAULT_MAX_COUNT,
        };

        let log_json = match get("GYM_LOG_JSON") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| invalid("GYM_LOG_JSON", &raw, "expected a boolean"))?,
            None => false,
        };

        Ok(Config {
            bind,
            data_source,
            utc_offset,
            leaderboard_size,
            log_json,
        })
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Accepts `Z`, `UTC` or a signed `+HH:MM` offset.
fn parse_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }
    raw.parse::<FixedOffset>()
        .map_err(|e| invalid("GYM_UTC_OFFSET", raw, e))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert_eq!(config.leaderboard_size, 3);
        assert!(!config.log_json);
        match config.data_source {
            DataSource::Sqlite { database_url } => assert_eq!(database_url, DEFAULT_DATABASE_URL),
            DataSource::Rest(_) => panic!("expected sqlite"),
        }
    }

    #[test]
    fn test_rest_source_and_offset() {
        let config = config_from(&[
            ("GYM_DATA_SOURCE", "REST"),
            ("GYM_REST_URL", "https://example.supabase.co"),
            ("GYM_REST_API_KEY", "anon-key"),
            ("GYM_REST_TIMEOUT_SECS", "4"),
            ("GYM_UTC_OFFSET", "+09:00"),
            ("GYM_LEADERBOARD_SIZE", "5"),
            ("GYM_LOG_JSON", "true"),
        ])
        .unwrap();

        assert_eq!(config.utc_offset.local_minus_utc(), 9 * 3600);
        assert_eq!(config.leaderboard_size, 5);
        assert!(config.log_json);
        assert_eq!(config.data_source.kind(), DataSourceKind::Rest);
        match config.data_source {
            DataSource::Rest(rest) => {
                assert_eq!(rest.base_url.host_str(), Some("example.supabase.co"));
                assert_eq!(rest.api_key.expose_secret(), "anon-key");
                assert_eq!(rest.timeout, Duration::from_secs(4));
            }
            DataSource::Sqlite { .. } => panic!("expected rest"),
        }
    }

    #[test]
    fn test_rest_source_requires_credentials() {
        let err = config_from(&[("GYM_DATA_SOURCE", "rest"), ("GYM_REST_URL", "https://x.io")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GYM_REST_API_KEY")));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            config_from(&[("GYM_LEADERBOARD_SIZE", "0")]),
            Err(ConfigError::Invalid { key: "GYM_LEADERBOARD_SIZE", .. })
        ));
        assert!(matches!(
            config_from(&[("GYM_UTC_OFFSET", "Asia/Seoul")]),
            Err(ConfigError::Invalid { key: "GYM_UTC_OFFSET", .. })
        ));
        assert!(matches!(
            config_from(&[("GYM_DATA_SOURCE", "postgres")]),
            Err(ConfigError::Invalid { key: "GYM_DATA_SOURCE", .. })
        ));
    }

    #[test]
    fn test_utc_aliases() {
        let config = config_from(&[("GYM_UTC_OFFSET", "UTC")]).unwrap();
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
    }
}
