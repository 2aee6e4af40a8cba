//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     reads the environment-variable configuration surface once at startup
//!     and hands the core an explicit value. core logic never touches the
//!     process environment itself, which keeps it independently testable.
//!
//! variables:
//!     - HOME_ASSISTANT_URL, API_TOKEN: upstream access (required live)
//!     - ENTITY_ID / ENTITIES: one id, or a comma-separated list
//!     - USE_DUMMY_DATA: replace the live client with the deterministic stand-in
//!     - REFRESH_INTERVAL_SECONDS: client-side page refresh cadence (advisory)
//!     - HISTORY_POINTS: ring buffer capacity per entity
//!     - UPSTREAM_TIMEOUT_SECONDS: per-request bound on upstream calls
//!     - BIND_HOST / BIND_PORT: listen address for the web server
//!
//! ==============================================================================

use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REFRESH_SECS: u64 = 15;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_BIND_PORT: u16 = 5000;

/// Fallback entity when dummy mode is on and no entity list is configured.
pub const DEFAULT_DUMMY_ENTITY: &str = "sensor.backyard_temperature";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set. Please set the environment variable.")]
    MissingVar(&'static str),
    #[error("no entities configured: set ENTITY_ID or ENTITIES")]
    EmptyEntities,
    #[error("history capacity must be at least 1")]
    ZeroHistoryCapacity,
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Which backend the registry polls.
#[derive(Debug, Clone)]
pub enum UpstreamMode {
    /// live Home Assistant REST API
    HomeAssistant {
        base_url: String,
        token: String,
        timeout: Duration,
    },
    /// deterministic stand-in, no network access
    Dummy,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upstream: UpstreamMode,
    pub entities: Vec<String>,
    pub history_points: usize,
    /// consumed by the page's meta-refresh tag, not enforced by the core
    pub refresh_interval_secs: u64,
    pub bind_host: String,
    pub bind_port: u16,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load through an arbitrary variable lookup. Tests pass a closure over a
    /// map instead of mutating the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let use_dummy = get("USE_DUMMY_DATA")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let mut entities = parse_entities(
            get("ENTITIES").or_else(|| get("ENTITY_ID")).as_deref(),
        );
        if entities.is_empty() && use_dummy {
            entities = vec![DEFAULT_DUMMY_ENTITY.to_string()];
        }
        if entities.is_empty() {
            return Err(ConfigError::EmptyEntities);
        }

        let upstream = if use_dummy {
            UpstreamMode::Dummy
        } else {
            let base_url = get("HOME_ASSISTANT_URL")
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar("HOME_ASSISTANT_URL"))?;
            let token = get("API_TOKEN")
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar("API_TOKEN"))?;
            let timeout_secs =
                parse_or("UPSTREAM_TIMEOUT_SECONDS", get("UPSTREAM_TIMEOUT_SECONDS"), DEFAULT_TIMEOUT_SECS)?;
            UpstreamMode::HomeAssistant {
                base_url,
                token,
                timeout: Duration::from_secs(timeout_secs),
            }
        };

        let history_points: usize =
            parse_or("HISTORY_POINTS", get("HISTORY_POINTS"), crate::history::DEFAULT_CAPACITY)?;
        if history_points == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }

        let refresh_interval_secs =
            parse_or("REFRESH_INTERVAL_SECONDS", get("REFRESH_INTERVAL_SECONDS"), DEFAULT_REFRESH_SECS)?;

        let bind_host = match get("BIND_HOST") {
            Some(h) if !h.is_empty() => h,
            _ => {
                tracing::warn!("BIND_HOST is not set. Using default: {:?}", DEFAULT_BIND_HOST);
                DEFAULT_BIND_HOST.to_string()
            }
        };
        let bind_port = match get("BIND_PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var: "BIND_PORT", value: p })?,
            None => {
                tracing::warn!("BIND_PORT is not set. Using default: {}", DEFAULT_BIND_PORT);
                DEFAULT_BIND_PORT
            }
        };

        Ok(Self {
            upstream,
            entities,
            history_points,
            refresh_interval_secs,
            bind_host,
            bind_port,
        })
    }
}

/// Split a comma-separated entity list, trimming whitespace and dropping
/// empty segments.
fn parse_entities(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(v) if !v.is_empty() => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: v }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn dummy_mode_needs_no_upstream_vars() {
        let config = AppConfig::from_lookup(lookup(&[("USE_DUMMY_DATA", "true")])).unwrap();
        assert!(matches!(config.upstream, UpstreamMode::Dummy));
        assert_eq!(config.entities, vec![DEFAULT_DUMMY_ENTITY.to_string()]);
        assert_eq!(config.history_points, 100);
        assert_eq!(config.refresh_interval_secs, DEFAULT_REFRESH_SECS);
    }

    #[test]
    fn live_mode_requires_url_and_token() {
        let err = AppConfig::from_lookup(lookup(&[("ENTITY_ID", "sensor.x")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("HOME_ASSISTANT_URL")));

        let err = AppConfig::from_lookup(lookup(&[
            ("ENTITY_ID", "sensor.x"),
            ("HOME_ASSISTANT_URL", "http://ha.local:8123"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("API_TOKEN")));
    }

    #[test]
    fn entities_list_is_split_and_trimmed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("USE_DUMMY_DATA", "true"),
            ("ENTITIES", "sensor.a, sensor.b ,, sensor.c"),
        ]))
        .unwrap();
        assert_eq!(config.entities, vec!["sensor.a", "sensor.b", "sensor.c"]);
    }

    #[test]
    fn entities_takes_precedence_over_entity_id() {
        let config = AppConfig::from_lookup(lookup(&[
            ("USE_DUMMY_DATA", "true"),
            ("ENTITY_ID", "sensor.single"),
            ("ENTITIES", "sensor.a,sensor.b"),
        ]))
        .unwrap();
        assert_eq!(config.entities, vec!["sensor.a", "sensor.b"]);
    }

    #[test]
    fn live_mode_without_entities_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("HOME_ASSISTANT_URL", "http://ha.local:8123"),
            ("API_TOKEN", "token"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyEntities));
    }

    #[test]
    fn zero_history_points_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("USE_DUMMY_DATA", "true"),
            ("HISTORY_POINTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroHistoryCapacity));
    }

    #[test]
    fn bad_numeric_value_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("USE_DUMMY_DATA", "true"),
            ("REFRESH_INTERVAL_SECONDS", "often"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var: "REFRESH_INTERVAL_SECONDS", .. }
        ));
    }

    #[test]
    fn timeout_and_bind_overrides_are_honored() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ENTITY_ID", "sensor.x"),
            ("HOME_ASSISTANT_URL", "http://ha.local:8123"),
            ("API_TOKEN", "token"),
            ("UPSTREAM_TIMEOUT_SECONDS", "3"),
            ("BIND_HOST", "127.0.0.1"),
            ("BIND_PORT", "8080"),
        ]))
        .unwrap();
        match config.upstream {
            UpstreamMode::HomeAssistant { timeout, .. } => {
                assert_eq!(timeout, Duration::from_secs(3));
            }
            UpstreamMode::Dummy => panic!("expected live mode"),
        }
        assert_eq!(config.bind_host, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
    }
}
