//! Wiring container settings
//!
//! Loads the container's lifecycle mode and logging settings from an optional
//! TOML file layered under `WIRING_*` environment variables.
//!
//! ```toml
//! mode = "eager"
//!
//! [logging]
//! level = "debug"
//! ansi = false
//! ```

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::{settings_from_toml, SettingsLoader, DEFAULT_ENV_PREFIX};
pub use types::{ContainerSettings, LifecycleMode, LoggingSettings};
