//! Startup orchestration.
//!
//! # Responsibilities
//! - Parse command line and environment
//! - Layer them over the optional config file and validate the result
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Precedence: flag > environment > config file > built-in default

use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    read_config, validate_config, BackendConfig, ConfigError, LogFormat, ProxyConfig,
};

/// Command line for the `lb-proxy` binary.
#[derive(Debug, Parser)]
#[command(name = "lb-proxy", version)]
#[command(about = "Health-checked round-robin HTTP load balancer", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "LB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on (all interfaces).
    #[arg(short, long, env = "LB_PORT")]
    pub port: Option<u16>,

    /// Comma separated list of backend base URLs.
    #[arg(short, long, env = "LB_BACKENDS", value_delimiter = ',')]
    pub backends: Vec<String>,

    /// Seconds between health check rounds.
    #[arg(long, env = "HEALTH_INTERVAL")]
    pub health_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LB_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log line format.
    #[arg(long, env = "LB_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Overwrite `config` with every value given on the command line or in
    /// the environment.
    pub fn apply(self, config: &mut ProxyConfig) {
        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{}", port);
        }

        let backends: Vec<BackendConfig> = self
            .backends
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .map(BackendConfig::new)
            .collect();
        if !backends.is_empty() {
            config.backends = backends;
        }

        if let Some(secs) = self.health_interval {
            config.health_check.interval_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}

/// Build the validated configuration the process runs with.
pub fn build_config(cli: Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
