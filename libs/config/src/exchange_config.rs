//! Exchange Configuration Module
//!
//! Loads engine limits and logging settings from an optional TOML file with
//! environment variable overrides (`MERIDIAN_` prefix, `__` between nested
//! keys). Missing keys fall back to production defaults.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Prefix for environment overrides, e.g. `MERIDIAN_LIMITS__MAX_HOPS`
pub const ENV_PREFIX: &str = "MERIDIAN";

/// Complete configuration for the exchange core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Precondition limits enforced before any state is touched
    pub limits: LimitsConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Engine limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum hops in one routed swap
    pub max_hops: usize,
    /// Maximum entries in one batch operation
    pub max_batch_size: usize,
    /// Bit width of each pool reserve (1..=128)
    pub reserve_bits: u32,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive, e.g. `info` or `meridian_exchange=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_hops: 8,
            max_batch_size: 256,
            reserve_bits: 128,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LimitsConfig {
    /// Largest value a single reserve may hold
    pub fn reserve_cap(&self) -> u128 {
        if self.reserve_bits >= 128 {
            u128::MAX
        } else {
            (1u128 << self.reserve_bits) - 1
        }
    }
}

impl ExchangeConfig {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading exchange config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(?config, "exchange config loaded");
        Ok(config)
    }

    /// Defaults plus environment overrides only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Save configuration as TOML
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write configuration to {:?}", path))?;
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_hops == 0 {
            bail!("limits.max_hops must be positive");
        }

        if self.limits.max_batch_size == 0 {
            bail!("limits.max_batch_size must be positive");
        }

        if self.limits.reserve_bits == 0 || self.limits.reserve_bits > 128 {
            bail!(
                "limits.reserve_bits must be within 1..=128, got {}",
                self.limits.reserve_bits
            );
        }

        if self.logging.level.trim().is_empty() {
            bail!("logging.level must not be empty");
        }

        Ok(())
    }
}
