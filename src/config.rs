use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level application config deserialized from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Detection and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Rolling detection window in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: u64,
    /// Minimum distinct wallets trading a token/side to trigger an alert.
    #[serde(default = "default_min_wallets")]
    pub min_wallets_threshold: usize,
    /// Polling interval in seconds between aggregation cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Spacing between consecutive per-wallet API calls, in milliseconds.
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay_ms: u64,
    /// Fetch attempts per wallet before skipping it for the cycle.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base retry delay in milliseconds (doubles per attempt).
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

fn default_window_hours() -> u64 {
    6
}

fn default_min_wallets() -> usize {
    3
}

fn default_poll_interval() -> u64 {
    60
}

fn default_rate_limit_delay() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    1000
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            min_wallets_threshold: default_min_wallets(),
            poll_interval_secs: default_poll_interval(),
            rate_limit_delay_ms: default_rate_limit_delay(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

impl SettingsConfig {
    pub fn window_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.window_hours as i64)
    }
}

impl AppConfig {
    /// Load config from the given TOML file path. A missing file yields the
    /// built-in defaults; a present but unparsable file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Write config to the given TOML file path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Secrets read from the environment (populated from `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Secrets {
    pub moralis_api_key: String,
    pub telegram_bot_token: String,
    /// Alert destinations, comma-separated in `TELEGRAM_CHAT_ID`.
    pub telegram_chat_ids: Vec<String>,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let moralis_api_key =
            std::env::var("MORALIS_API_KEY").context("MORALIS_API_KEY not set")?;
        let telegram_bot_token =
            std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;
        let telegram_chat_ids = std::env::var("TELEGRAM_CHAT_ID")
            .context("TELEGRAM_CHAT_ID not set")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        anyhow::ensure!(
            !telegram_chat_ids.is_empty(),
            "TELEGRAM_CHAT_ID contains no chat ids"
        );
        Ok(Self {
            moralis_api_key,
            telegram_bot_token,
            telegram_chat_ids,
        })
    }
}
