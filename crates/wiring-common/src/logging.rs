//! Logging setup
//!
//! The container itself only emits `tracing` events; binaries and tests
//! install a subscriber through this module. `RUST_LOG` takes precedence
//! over the configured level.

use tracing_subscriber::EnvFilter;
use wiring_config::LoggingSettings;

/// Fallback directive when neither `RUST_LOG` nor the settings parse
const FALLBACK_DIRECTIVE: &str = "info";

/// Build the filter for the given settings
pub fn build_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.level.trim()))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
}

/// Install a global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed; that is not an
/// error so repeated initialization stays harmless.
pub fn init_logging(settings: &LoggingSettings) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(build_filter(settings))
        .with_ansi(settings.ansi)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(level = %settings.level, "Logging initialized");
    }
    installed
}

/// Install a subscriber that writes through the test harness capture
pub fn init_test_logging() {
    let settings = LoggingSettings {
        level: "debug".to_string(),
        ansi: false,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(&settings))
        .with_test_writer()
        .try_init();
}
