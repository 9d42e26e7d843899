//! # Configuration Management Module
//!
//! TOML configuration for the relay bot.
//!
//! - [`BotConfig`] - the bot's own nickname and its command prefix
//! - [`StorageConfig`] - where the pending queue lives and how saves are coalesced
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use relaybot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Data dir: {}", config.storage.data_dir);
//!
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! nick = "relaybot"
//! command_prefix = "!"
//!
//! [storage]
//! data_dir = "./data"
//! save_coalesce_ms = 250
//!
//! [logging]
//! level = "info"
//! file = "relaybot.log"
//! ```
//!
//! `[storage]` and `[logging]` may be omitted; defaults apply.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// The bot's own nickname; its own lines never trigger a flush
    pub nick: String,
    /// Command prefix. Must be one of a hard-coded allowed set for safety.
    /// Examples: "!", "^", "+", "$", "/", ">". If unset or invalid, defaults to "!".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Window (ms) in which successive saves are merged into one write
    #[serde(default = "default_save_coalesce_ms")]
    pub save_coalesce_ms: u64,
}

fn default_save_coalesce_ms() -> u64 {
    250
}

impl StorageConfig {
    pub fn save_coalesce(&self) -> Duration {
        Duration::from_millis(self.save_coalesce_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            save_coalesce_ms: default_save_coalesce_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("relaybot.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parsed level, `Info` when the string is not a known level.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::parse(&content).map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                nick: "relaybot".to_string(),
                command_prefix: Some("!".to_string()),
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse("[bot]\nnick = \"herald\"\n").unwrap();
        assert_eq!(config.bot.nick, "herald");
        assert_eq!(config.bot.command_prefix, None);
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.storage.save_coalesce(), Duration::from_millis(250));
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back = Config::parse(&text).unwrap();
        assert_eq!(back.bot.nick, "relaybot");
        assert_eq!(back.bot.command_prefix.as_deref(), Some("!"));
        assert_eq!(back.logging.file.as_deref(), Some("relaybot.log"));
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(include_str!("../../config.example.toml")).unwrap();
        assert_eq!(config.bot.nick, "relaybot");
        assert_eq!(config.storage.save_coalesce_ms, 250);
    }

    #[test]
    fn test_bad_log_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "chatty".into(),
            file: None,
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
        let logging = LoggingConfig {
            level: "debug".into(),
            file: None,
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Debug);
    }

    #[tokio::test]
    async fn test_create_default_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        let path = path.to_string_lossy().to_string();
        Config::create_default(&path).await.unwrap();
        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.storage.save_coalesce_ms, 250);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        assert!(Config::load("/nonexistent/relaybot.toml").await.is_err());
    }
}
