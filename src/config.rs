use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::poller::PollSettings;

/// Everything a run needs, loaded once at startup and passed down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// `host:port` of the ingest service
    #[serde(default = "default_write_host")]
    pub write_host: String,

    /// `host:port` of the query service
    #[serde(default = "default_query_host")]
    pub query_host: String,

    /// Metric written and queried every round
    #[serde(default = "default_metric")]
    pub metric: String,

    #[serde(default = "default_timeout_secs")]
    pub write_timeout_secs: u64,

    /// Deadline for the whole poll loop of one round
    #[serde(default = "default_timeout_secs")]
    pub round_timeout_secs: u64,

    /// Bound for each individual query; the round timeout when unset
    #[serde(default)]
    pub query_timeout_secs: Option<u64>,

    /// Pause before every query attempt
    #[serde(default)]
    pub delay_ms: u64,

    /// Query window is `[timestamp, timestamp + window_secs]`
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Number of rounds
    #[serde(default = "default_repeat")]
    pub repeat: u64,

    /// Rounds in flight at once; 1 runs them strictly one after another
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

fn default_write_host() -> String {
    "localhost:5444".into()
}
fn default_query_host() -> String {
    "localhost:8444".into()
}
fn default_metric() -> String {
    "latency_probe/heartbeat".into()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_window_secs() -> u64 {
    10
}
fn default_repeat() -> u64 {
    1
}
fn default_concurrency() -> u32 {
    1
}

const MAX_CONCURRENCY: u32 = 64;

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            write_host: default_write_host(),
            query_host: default_query_host(),
            metric: default_metric(),
            write_timeout_secs: default_timeout_secs(),
            round_timeout_secs: default_timeout_secs(),
            query_timeout_secs: None,
            delay_ms: 0,
            window_secs: default_window_secs(),
            repeat: default_repeat(),
            concurrency: default_concurrency(),
        }
    }
}

impl ProbeConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_host.trim().is_empty() || self.query_host.trim().is_empty() {
            return Err(ConfigError::Invalid("hosts must not be empty".into()));
        }
        if self.metric.is_empty() || self.metric.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "metric must be non-empty and contain no whitespace".into(),
            ));
        }
        if self.write_timeout_secs == 0
            || self.round_timeout_secs == 0
            || self.query_timeout_secs == Some(0)
        {
            return Err(ConfigError::Invalid("timeouts must be at least 1 second".into()));
        }
        if self.query_timeout_secs.is_some_and(|q| q > self.round_timeout_secs) {
            return Err(ConfigError::Invalid(
                "query timeout must not exceed the round timeout".into(),
            ));
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::Invalid(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}"
            )));
        }
        Ok(())
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            round_timeout: Duration::from_secs(self.round_timeout_secs),
            query_timeout: Duration::from_secs(
                self.query_timeout_secs.unwrap_or(self.round_timeout_secs),
            ),
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ProbeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.repeat, 1);
        assert_eq!(config.window_secs, 10);
        assert_eq!(config.poll_settings().round_timeout, Duration::from_secs(300));
        assert_eq!(config.poll_settings().delay, Duration::ZERO);
    }

    #[test]
    fn query_timeout_follows_round_timeout_unless_set() {
        let config = ProbeConfig {
            round_timeout_secs: 60,
            ..ProbeConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_settings().query_timeout, Duration::from_secs(60));

        let config = ProbeConfig {
            query_timeout_secs: Some(5),
            ..config
        };
        assert_eq!(config.poll_settings().query_timeout, Duration::from_secs(5));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"metric": "probe.m", "delay_ms": 250}}"#).unwrap();

        let config = ProbeConfig::load(file.path()).unwrap();
        assert_eq!(config.metric, "probe.m");
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.query_host, "localhost:8444");
        assert_eq!(config.poll_settings().delay, Duration::from_millis(250));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"metrik": "typo"}}"#).unwrap();
        assert!(matches!(
            ProbeConfig::load(file.path()),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ProbeConfig::load(Path::new("/nonexistent/probe.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad = [
            ProbeConfig {
                metric: "has space".into(),
                ..ProbeConfig::default()
            },
            ProbeConfig {
                query_host: "".into(),
                ..ProbeConfig::default()
            },
            ProbeConfig {
                round_timeout_secs: 0,
                ..ProbeConfig::default()
            },
            ProbeConfig {
                query_timeout_secs: Some(600),
                round_timeout_secs: 300,
                ..ProbeConfig::default()
            },
            ProbeConfig {
                concurrency: 0,
                ..ProbeConfig::default()
            },
            ProbeConfig {
                concurrency: MAX_CONCURRENCY + 1,
                ..ProbeConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))), "{config:?}");
        }
    }
}
