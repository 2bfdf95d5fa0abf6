pub mod constants;
pub mod types;

pub use types::*;

use anyhow::{Context, Result};
use constants::VALID_LOG_LEVELS;
use std::fs;
use std::path::Path;

impl AccountingConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();

        let raw = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read configuration {}", config_path.display()))?;

        let cfg = Self::from_json(&raw)
            .with_context(|| format!("Invalid configuration {}", config_path.display()))?;

        Ok(cfg)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: AccountingConfig =
            serde_json::from_str(raw).context("Failed to deserialize configuration")?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.update_channel_capacity == 0 {
            anyhow::bail!("update_channel_capacity must be positive");
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}', must be one of: {:?}",
                self.log_level,
                VALID_LOG_LEVELS
            );
        }

        Ok(())
    }
}
