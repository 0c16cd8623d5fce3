//! Settings loader implementation

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use crate::{
    error::Result,
    types::ContainerSettings,
};

/// Default environment prefix (`WIRING_MODE`, `WIRING_LOGGING__LEVEL`, ...)
pub const DEFAULT_ENV_PREFIX: &str = "WIRING";

/// Loads [`ContainerSettings`] from an optional TOML file layered under
/// environment variables.
pub struct SettingsLoader {
    /// Settings file path
    config_path: PathBuf,
    /// Environment prefix
    env_prefix: String,
}

impl SettingsLoader {
    /// Create a loader for the default settings path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Create with custom settings path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment prefix
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Settings file this loader reads
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get default settings path
    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wiring")
            .join("config.toml")
    }

    /// Load settings; a missing file falls back to defaults.
    pub fn load(&self) -> Result<ContainerSettings> {
        let builder = Config::builder()
            .add_source(
                File::from(self.config_path.clone())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let settings: ContainerSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        debug!(
            path = %self.config_path.display(),
            mode = %settings.mode,
            "Loaded container settings"
        );
        Ok(settings)
    }

    /// Write settings as TOML, creating parent directories
    pub fn save(&self, settings: &ContainerSettings) -> Result<()> {
        settings.validate()?;
        let toml = toml::to_string(settings)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse settings from a TOML string (no environment layering)
pub fn settings_from_toml(source: &str) -> Result<ContainerSettings> {
    let settings: ContainerSettings = Config::builder()
        .add_source(File::from_str(source, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

