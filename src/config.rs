use chrono::Utc;
use serde::Deserialize;

use crate::services::{window_start, DEFAULT_STALENESS_WINDOW_DAYS};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How far back availability observations are considered, in days
    #[serde(default = "default_staleness_window_days")]
    pub staleness_window_days: i64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_staleness_window_days() -> i64 {
    DEFAULT_STALENESS_WINDOW_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            staleness_window_days: default_staleness_window_days(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Rejects settings the analysis core would refuse at request time
    pub fn validate(&self) -> anyhow::Result<()> {
        window_start(Utc::now(), self.staleness_window_days)
            .map_err(|e| anyhow::anyhow!("Invalid STALENESS_WINDOW_DAYS: {}", e))?;
        Ok(())
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
