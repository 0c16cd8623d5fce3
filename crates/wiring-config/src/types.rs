//! Core settings types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// When the container produces its components.
///
/// Chosen once at startup; the container never switches modes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleMode {
    /// Prepared: components are produced on first resolution
    #[default]
    Lazy,
    /// Booted: every component is produced right after registration
    Eager,
}

impl LifecycleMode {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleMode::Lazy => "lazy",
            LifecycleMode::Eager => "eager",
        }
    }
}

impl fmt::Display for LifecycleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lazy" | "prepared" => Ok(LifecycleMode::Lazy),
            "eager" | "booted" => Ok(LifecycleMode::Eager),
            other => Err(ConfigError::Validation(format!(
                "Unknown lifecycle mode '{}' (expected 'lazy' or 'eager')",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Minimum level or filter directive, e.g. `info` or `wiring_di=debug`
    pub level: String,
    /// Colored output
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

/// Top-level container settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ContainerSettings {
    /// Lifecycle mode of the container
    pub mode: LifecycleMode,
    /// Logging configuration
    pub logging: LoggingSettings,
}

impl ContainerSettings {
    /// Settings with the given mode and default logging
    pub fn with_mode(mode: LifecycleMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.trim();
        if level.is_empty() {
            return Err(ConfigError::Validation(
                "Log level must not be empty".to_string(),
            ));
        }

        // Bare levels are checked here; full filter directives are left to
        // the subscriber.
        if !level.contains('=') && !level.contains(',') {
            const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
            if !LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Unknown log level '{}'",
                    level
                )));
            }
        }
        Ok(())
    }
}
