//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::preferences::DEFAULT_MAX_CYCLES;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;

    info!(
        name = %config.bot.name,
        dry_run = config.bot.dry_run,
        poll_ms = config.engine.poll_interval_ms,
        max_attempts = config.engine.max_delivery_attempts,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig =
        toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
    anyhow::ensure!(
        !config.bot.bot_token_env.is_empty(),
        "bot.bot_token_env must name an environment variable"
    );

    anyhow::ensure!(!config.api.base_url.is_empty(), "Bot API base URL must not be empty");
    anyhow::ensure!(
        config.api.max_requests_per_second > 0,
        "max_requests_per_second must be positive"
    );
    anyhow::ensure!(config.api.timeout_seconds > 0, "API timeout must be positive");

    anyhow::ensure!(
        config.engine.poll_interval_ms > 0,
        "engine.poll_interval_ms must be positive"
    );
    anyhow::ensure!(
        config.engine.max_delivery_attempts >= 1,
        "engine.max_delivery_attempts must be at least 1, got {}",
        config.engine.max_delivery_attempts
    );

    anyhow::ensure!(
        (1..=DEFAULT_MAX_CYCLES).contains(&config.preferences.max_cycles),
        "preferences.max_cycles must be in 1..={DEFAULT_MAX_CYCLES}, got {}",
        config.preferences.max_cycles
    );

    anyhow::ensure!(
        !config.persistence.data_dir.is_empty(),
        "persistence.data_dir must not be empty"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [bot]
        name = "gift-autobuy"

        [api]

        [persistence]

        [metrics]
    "#;

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.bot.bot_token_env, "BOT_TOKEN");
        assert_eq!(config.api.base_url, "https://api.telegram.org");
        assert_eq!(config.engine.max_delivery_attempts, 60);
        assert_eq!(config.engine.cooldown_seconds, 60);
        assert_eq!(config.preferences.max_price, 1_000_000);
        assert_eq!(config.preferences.max_cycles, 100);
        assert_eq!(config.persistence.data_dir, "data");
        assert!(!config.bot.dry_run);
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = parse_config(include_str!("../../config.example.toml")).unwrap();
        assert!(config.bot.dry_run);
        assert!(config.bot.gift_text.is_none());
        assert!(config.engine.attempt_memory().is_none());
        assert_eq!(config.metrics.health_port, 8080);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let text = format!("{MINIMAL}\n[engine]\nmax_delivery_attempts = 0\n");
        assert!(parse_config(&text).is_err());
    }

    #[test]
    fn test_max_cycles_bounded() {
        let over = format!("{MINIMAL}\n[preferences]\nmax_cycles = 101\n");
        assert!(parse_config(&over).is_err());

        let zero = format!("{MINIMAL}\n[preferences]\nmax_cycles = 0\n");
        assert!(parse_config(&zero).is_err());

        let lower = format!("{MINIMAL}\n[preferences]\nmax_cycles = 10\n");
        assert_eq!(parse_config(&lower).unwrap().preferences.max_cycles, 10);
    }

    #[test]
    fn test_engine_overrides() {
        let text = format!(
            "{MINIMAL}\n[engine]\npoll_interval_ms = 250\nretry_delay_ms = 10\nattempt_memory_seconds = 300\n"
        );
        let config = parse_config(&text).unwrap();
        assert_eq!(config.engine.poll_interval_ms, 250);
        assert_eq!(config.engine.retry_delay_ms, 10);
        assert_eq!(config.engine.attempt_memory_seconds, 300);
    }
}
