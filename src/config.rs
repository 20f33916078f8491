// ABOUTME: Configuration for the keep-alive coordinator.
// ABOUTME: Supports defaults, JSON settings files, and environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Env var overriding the coalescing window, in milliseconds.
pub const COALESCE_PERIOD_ENV: &str = "KEEPALIVE_COALESCE_PERIOD_MS";
/// Env var overriding the delay between retries, in milliseconds.
pub const RETRY_DELAY_ENV: &str = "KEEPALIVE_RETRY_DELAY_MS";
/// Env var overriding the number of retries after the first attempt.
pub const MAX_RETRIES_ENV: &str = "KEEPALIVE_MAX_RETRIES";
/// Env var holding the seconds of inactivity before the workspace idles.
pub const IDLE_TIMEOUT_ENV: &str = "KEEPALIVE_IDLE_TIMEOUT_SECS";

const DEFAULT_COALESCE_PERIOD: Duration = Duration::from_secs(60);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Where the idle-eviction timeout comes from.
///
/// The value is resolved each time a warning is composed, so an
/// environment-backed timeout reflects the current process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdleTimeout {
    /// No timeout is known; warnings carry no duration.
    #[default]
    None,
    /// A fixed number of seconds.
    Fixed(u64),
    /// Read from the named environment variable.
    Env(String),
}

impl IdleTimeout {
    /// Resolve the timeout in seconds against the process environment.
    pub fn resolve(&self) -> Option<u64> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve the timeout using a custom variable lookup.
    ///
    /// Unset, empty, unparseable and zero values all resolve to `None`.
    pub fn resolve_with<F>(&self, lookup: F) -> Option<u64>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = match self {
            IdleTimeout::None => return None,
            IdleTimeout::Fixed(secs) => *secs,
            IdleTimeout::Env(key) => lookup(key.as_str())?.trim().parse().ok()?,
        };
        (secs > 0).then_some(secs)
    }
}

/// Configuration for [`KeepaliveCoordinator`](crate::coordinator::KeepaliveCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct KeepaliveConfig {
    /// Length of a coalescing window.
    pub coalesce_period: Duration,
    /// Delay between a failed report and the next attempt.
    pub retry_delay: Duration,
    /// Retries after the first attempt before an episode is exhausted.
    pub max_retries: u32,
    /// Source of the idle-eviction timeout shown in warnings.
    pub idle_timeout: IdleTimeout,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            coalesce_period: DEFAULT_COALESCE_PERIOD,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            idle_timeout: IdleTimeout::None,
        }
    }
}

/// On-disk shape of the configuration. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    coalesce_period_ms: Option<u64>,
    retry_delay_ms: Option<u64>,
    max_retries: Option<u32>,
    idle_timeout_secs: Option<u64>,
    idle_timeout_env: Option<String>,
}

impl From<ConfigFile> for KeepaliveConfig {
    fn from(file: ConfigFile) -> Self {
        let defaults = KeepaliveConfig::default();
        let idle_timeout = match (file.idle_timeout_secs, file.idle_timeout_env) {
            (Some(secs), _) => IdleTimeout::Fixed(secs),
            (None, Some(key)) => IdleTimeout::Env(key),
            (None, None) => IdleTimeout::None,
        };
        Self {
            coalesce_period: file
                .coalesce_period_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.coalesce_period),
            retry_delay: file
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            max_retries: file.max_retries.unwrap_or(defaults.max_retries),
            idle_timeout,
        }
    }
}

impl KeepaliveConfig {
    /// Create a configuration with the default timings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from defaults plus environment overrides.
    ///
    /// The idle timeout is read from [`IDLE_TIMEOUT_ENV`] whenever a
    /// warning is shown.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from defaults plus overrides from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            idle_timeout: IdleTimeout::Env(IDLE_TIMEOUT_ENV.to_string()),
            ..Self::default()
        };

        if let Some(ms) = parse_override::<u64, _>(&lookup, COALESCE_PERIOD_ENV)? {
            config.coalesce_period = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_override::<u64, _>(&lookup, RETRY_DELAY_ENV)? {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_override::<u32, _>(&lookup, MAX_RETRIES_ENV)? {
            config.max_retries = retries;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON settings file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the coalescing window.
    pub fn with_coalesce_period(mut self, period: Duration) -> Self {
        self.coalesce_period = period;
        self
    }

    /// Set the delay between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the number of retries after the first attempt.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the idle-timeout source.
    pub fn with_idle_timeout(mut self, idle_timeout: IdleTimeout) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Check that the timings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coalesce_period.is_zero() {
            return Err(ConfigError::ZeroCoalescePeriod);
        }
        Ok(())
    }
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = KeepaliveConfig::default();
        assert_eq!(config.coalesce_period, Duration::from_secs(60));
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.idle_timeout, IdleTimeout::None);
    }

    #[test]
    fn test_from_lookup_without_overrides() {
        let config = KeepaliveConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.coalesce_period, Duration::from_secs(60));
        assert_eq!(
            config.idle_timeout,
            IdleTimeout::Env(IDLE_TIMEOUT_ENV.to_string())
        );
    }

    #[test]
    fn test_from_lookup_applies_overrides() {
        let config = KeepaliveConfig::from_lookup(lookup_from(&[
            (COALESCE_PERIOD_ENV, "1500"),
            (RETRY_DELAY_ENV, " 250 "),
            (MAX_RETRIES_ENV, "2"),
        ]))
        .unwrap();
        assert_eq!(config.coalesce_period, Duration::from_millis(1500));
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = KeepaliveConfig::from_lookup(lookup_from(&[(MAX_RETRIES_ENV, "many")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, MAX_RETRIES_ENV);
                assert_eq!(value, "many");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup_rejects_zero_period() {
        let err = KeepaliveConfig::from_lookup(lookup_from(&[(COALESCE_PERIOD_ENV, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroCoalescePeriod));
    }

    #[test]
    fn test_idle_timeout_resolution() {
        let lookup = lookup_from(&[
            ("IDLE", "3723"),
            ("EMPTY", ""),
            ("BAD", "soon"),
            ("ZERO", "0"),
        ]);
        assert_eq!(IdleTimeout::None.resolve_with(&lookup), None);
        assert_eq!(IdleTimeout::Fixed(90).resolve_with(&lookup), Some(90));
        assert_eq!(IdleTimeout::Fixed(0).resolve_with(&lookup), None);
        assert_eq!(IdleTimeout::Env("IDLE".into()).resolve_with(&lookup), Some(3723));
        assert_eq!(IdleTimeout::Env("EMPTY".into()).resolve_with(&lookup), None);
        assert_eq!(IdleTimeout::Env("BAD".into()).resolve_with(&lookup), None);
        assert_eq!(IdleTimeout::Env("ZERO".into()).resolve_with(&lookup), None);
        assert_eq!(IdleTimeout::Env("MISSING".into()).resolve_with(&lookup), None);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"coalesce_period_ms": 30000, "max_retries": 3, "idle_timeout_secs": 3600}}"#
        )
        .unwrap();

        let config = KeepaliveConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.coalesce_period, Duration::from_secs(30));
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.idle_timeout, IdleTimeout::Fixed(3600));
    }

    #[test]
    fn test_json_env_idle_timeout() {
        let config: KeepaliveConfig =
            serde_json::from_str(r#"{"idle_timeout_env": "WORKSPACE_IDLE"}"#).unwrap();
        assert_eq!(config.idle_timeout, IdleTimeout::Env("WORKSPACE_IDLE".into()));
    }

    #[test]
    fn test_json_rejects_unknown_fields() {
        let result: Result<KeepaliveConfig, _> = serde_json::from_str(r#"{"period": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = KeepaliveConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
