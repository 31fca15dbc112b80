//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml`. The bot token is
//! never stored in the file: `bot.bot_token_env` names the environment
//! variable that holds it. Engine timing defaults match the production
//! policy (1s idle tick, 60s cool-down, 60 delivery attempts 1s apart).

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::preferences::PreferenceLimits;

/// Top-level bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bot identity and metadata.
    pub bot: BotConfig,
    /// Telegram Bot API endpoint.
    pub api: ApiConfig,
    /// Poll loop and dispatch policy.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Bounds enforced on preference updates.
    #[serde(default)]
    pub preferences: PreferenceLimits,
    /// Persistence configuration.
    pub persistence: PersistenceConfig,
    /// Metrics and monitoring.
    pub metrics: MetricsConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Human-readable bot name.
    pub name: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Environment variable holding the Bot API token.
    #[serde(default = "default_token_env")]
    pub bot_token_env: String,
    /// Enable dry-run mode (no real gifts sent).
    #[serde(default)]
    pub dry_run: bool,
    /// Optional message attached to every sent gift.
    #[serde(default)]
    pub gift_text: Option<String>,
}

/// Bot API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Bot API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Outgoing request budget.
    #[serde(default = "default_requests_per_second")]
    pub max_requests_per_second: u32,
}

/// Poll loop and dispatch policy.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Idle sleep between catalog polls (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Pause after a pass that settled anything (seconds).
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,
    /// Attempt ceiling per planned gift.
    #[serde(default = "default_max_attempts")]
    pub max_delivery_attempts: u32,
    /// Fixed delay between delivery attempts (milliseconds).
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Window during which an attempted (account, gift) pair is not
    /// re-allocated on later polls. 0 disables the memory.
    #[serde(default)]
    pub attempt_memory_seconds: u64,
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// `None` when cross-poll attempt memory is disabled.
    pub fn attempt_memory(&self) -> Option<Duration> {
        (self.attempt_memory_seconds > 0).then(|| Duration::from_secs(self.attempt_memory_seconds))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            cooldown_seconds: default_cooldown(),
            max_delivery_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
            attempt_memory_seconds: 0,
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for the ledger journal and settings snapshot.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics export.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Metrics server bind address.
    #[serde(default = "default_metrics_addr")]
    pub bind_address: String,
    /// Health check endpoint port.
    #[serde(default = "default_health_port")]
    pub health_port: u16,
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_env() -> String {
    "BOT_TOKEN".to_string()
}

fn default_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_requests_per_second() -> u32 {
    25
}

fn default_poll_interval() -> u64 {
    1_000
}

fn default_cooldown() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    60
}

fn default_retry_delay() -> u64 {
    1_000
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
    8080
}
