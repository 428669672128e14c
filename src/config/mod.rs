//! # Configuration
//!
//! TOML configuration for the chatpager runtime and the `demo` driver.
//!
//! ## Sections
//!
//! - [`BotConfig`] - identity used when posting (name, demo channel and user ids)
//! - [`ResponseConfig`] - defaults applied to every response builder
//! - [`CacheConfig`] - sweeper cadence
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chatpager::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("chatpager.toml").await?;
//!     let config = Config::load("chatpager.toml").await?;
//!     println!("responses live for {}s", config.responses.time_to_live_secs);
//!     Ok(())
//! }
//! ```
//!
//! ## File Format
//!
//! ```toml
//! [bot]
//! name = "chatpager"
//! demo_channel = 1
//! demo_user = 1
//!
//! [responses]
//! time_to_live_secs = 10
//! items_per_page = 12
//! render_paging_components = true
//!
//! [cache]
//! sweep_interval_ms = 1000
//! stats_interval_ms = 60000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section except `[bot]` may be omitted; missing fields fall back to their defaults.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::response::item_handler::{DEFAULT_ITEMS_PER_PAGE, MAX_ITEMS_PER_PAGE};
use crate::response::tree::{DEFAULT_TIME_TO_LIVE, MAX_TIME_TO_LIVE, MIN_TIME_TO_LIVE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub responses: ResponseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Channel the `demo` command posts into.
    #[serde(default = "default_demo_id")]
    pub demo_channel: u64,
    /// User the `demo` command interacts as.
    #[serde(default = "default_demo_id")]
    pub demo_user: u64,
}

fn default_demo_id() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Idle lifetime of a sent response, seconds (5-300).
    #[serde(default = "default_time_to_live")]
    pub time_to_live_secs: u32,
    /// Window size for item pagination (1-24).
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
    #[serde(default = "default_render_paging")]
    pub render_paging_components: bool,
}

fn default_time_to_live() -> u32 {
    DEFAULT_TIME_TO_LIVE
}

fn default_items_per_page() -> usize {
    DEFAULT_ITEMS_PER_PAGE
}

fn default_render_paging() -> bool {
    true
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            time_to_live_secs: default_time_to_live(),
            items_per_page: default_items_per_page(),
            render_paging_components: default_render_paging(),
        }
    }
}

impl ResponseConfig {
    pub fn time_to_live(&self) -> u32 {
        self.time_to_live_secs
            .clamp(MIN_TIME_TO_LIVE, MAX_TIME_TO_LIVE)
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page.clamp(1, MAX_ITEMS_PER_PAGE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Zero disables the periodic stats line.
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

fn default_sweep_interval_ms() -> u64 {
    1000
}

fn default_stats_interval_ms() -> u64 {
    60_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: default_sweep_interval_ms(),
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        Config::default().save(path).await
    }

    pub async fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

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
                name: "chatpager".to_string(),
                description: Some("Paginated interactive responses".to_string()),
                demo_channel: default_demo_id(),
                demo_user: default_demo_id(),
            },
            responses: ResponseConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("chatpager.log".to_string()),
            },
        }
    }
}
