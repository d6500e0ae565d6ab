//! Diagnostic log setup on top of `tracing`.
//!
//! This is the developer-facing sink only; what the user sees lives in
//! `ScreenStatus`.

use crate::error::AppError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub include_target: bool,
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            include_target: true,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Installs the global subscriber. Fails if one is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), AppError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level.to_tracing_level())
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_is_debug() {
        assert_eq!(LogConfig::verbose().level.to_tracing_level(), Level::DEBUG);
    }

    #[test]
    fn test_second_install_is_config_error() {
        // Whichever call wins the global slot, the other must report it.
        let first = init_logging(&LogConfig::default());
        let second = init_logging(&LogConfig::default());
        assert!(first.is_ok() || matches!(first, Err(AppError::Config(_))));
        assert!(matches!(second, Err(AppError::Config(_))));
    }
}
