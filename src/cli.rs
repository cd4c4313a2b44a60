use std::path::PathBuf;

use clap::Parser;

use crate::config::ProbeConfig;
use crate::error::ConfigError;

/// Measure how long a written data point takes to become visible to queries.
#[derive(Debug, Parser)]
#[command(name = "tsdb-latency-probe", version)]
pub struct Cli {
    /// Number of measurement rounds to run [default: 1]
    pub repeat: Option<u64>,

    /// JSON config file; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "HOST:PORT")]
    pub write_host: Option<String>,

    #[arg(long, value_name = "HOST:PORT")]
    pub query_host: Option<String>,

    #[arg(long)]
    pub metric: Option<String>,

    #[arg(long, value_name = "SECS")]
    pub write_timeout_secs: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub round_timeout_secs: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub query_timeout_secs: Option<u64>,

    /// Pause before each query attempt
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub window_secs: Option<u64>,

    /// Rounds to run in parallel
    #[arg(long)]
    pub concurrency: Option<u32>,
}

impl Cli {
    /// Config file (or defaults), then flag overrides, then validation.
    pub fn resolve(&self) -> Result<ProbeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ProbeConfig::load(path)?,
            None => ProbeConfig::default(),
        };

        if let Some(v) = self.repeat {
            config.repeat = v;
        }
        if let Some(v) = &self.write_host {
            config.write_host = v.clone();
        }
        if let Some(v) = &self.query_host {
            config.query_host = v.clone();
        }
        if let Some(v) = &self.metric {
            config.metric = v.clone();
        }
        if let Some(v) = self.write_timeout_secs {
            config.write_timeout_secs = v;
        }
        if let Some(v) = self.round_timeout_secs {
            config.round_timeout_secs = v;
        }
        if let Some(v) = self.query_timeout_secs {
            config.query_timeout_secs = Some(v);
        }
        if let Some(v) = self.delay_ms {
            config.delay_ms = v;
        }
        if let Some(v) = self.window_secs {
            config.window_secs = v;
        }
        if let Some(v) = self.concurrency {
            config.concurrency = v;
        }

        config.validate()?;
        Ok(config)
    }
}
