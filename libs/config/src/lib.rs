//! # Meridian Configuration
//!
//! Centralized configuration for the exchange core: engine limits (route
//! length, batch size, reserve width) and logging settings.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use meridian_config::ExchangeConfig;
//!
//! // TOML file, then MERIDIAN_-prefixed environment overrides
//! // e.g. MERIDIAN_LIMITS__MAX_HOPS=4
//! let config = ExchangeConfig::load(Some("config/exchange.toml".as_ref()))?;
//! assert!(config.limits.max_hops >= 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod exchange_config;

pub use exchange_config::{ExchangeConfig, LimitsConfig, LoggingConfig, ENV_PREFIX};
