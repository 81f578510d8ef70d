//! Standardized emoji logging for exchange operations
//!
//! Keeps the markers consistent across swap, liquidity and settlement paths
//! and installs the `tracing` subscriber from [`LoggingConfig`].

use meridian_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Standard emoji set for exchange logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅";
    pub const ERROR: &'static str = "❌";
    pub const WARNING: &'static str = "⚠️";

    // Event types
    pub const SWAP: &'static str = "🔄";
    pub const MINT: &'static str = "➕";
    pub const BURN: &'static str = "➖";
    pub const POOL: &'static str = "🏊";
    pub const SETTLE: &'static str = "💰";
}

#[macro_export]
macro_rules! log_swap {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SWAP, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_liquidity {
    (mint, $($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::MINT, format!($($arg)*))
    };
    (burn, $($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::BURN, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_pool {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::POOL, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_settle {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SETTLE, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_failure {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

/// Install a global subscriber; returns false if one was already set
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };
    result.is_ok()
}
