//! Settings loading tests

use wiring_config::*;

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loader = SettingsLoader::with_path(dir.path().join("absent.toml"))
        .env_prefix("WIRING_TEST_MISSING");

    let settings = loader.load().unwrap();
    assert_eq!(settings, ContainerSettings::default());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "mode = \"eager\"\n\n[logging]\nlevel = \"debug\"\nansi = false\n",
    )
    .unwrap();

    let settings = SettingsLoader::with_path(&path)
        .env_prefix("WIRING_TEST_FILE")
        .load()
        .unwrap();

    assert_eq!(settings.mode, LifecycleMode::Eager);
    assert_eq!(settings.logging.level, "debug");
    assert!(!settings.logging.ansi);
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "mode = \"lazy\"\n").unwrap();

    std::env::set_var("WIRING_TEST_ENV_MODE", "eager");
    std::env::set_var("WIRING_TEST_ENV_LOGGING__LEVEL", "warn");

    let settings = SettingsLoader::with_path(&path)
        .env_prefix("WIRING_TEST_ENV")
        .load()
        .unwrap();

    std::env::remove_var("WIRING_TEST_ENV_MODE");
    std::env::remove_var("WIRING_TEST_ENV_LOGGING__LEVEL");

    assert_eq!(settings.mode, LifecycleMode::Eager);
    assert_eq!(settings.logging.level, "warn");
}

#[test]
fn test_invalid_mode_is_rejected() {
    let result = settings_from_toml("mode = \"sometimes\"\n");
    assert!(result.is_err());
}

#[test]
fn test_invalid_level_is_rejected() {
    let result = settings_from_toml("[logging]\nlevel = \"loud\"\n");
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let loader = SettingsLoader::with_path(dir.path().join("nested").join("config.toml"))
        .env_prefix("WIRING_TEST_SAVE");

    let settings = ContainerSettings::with_mode(LifecycleMode::Eager);
    loader.save(&settings).unwrap();

    assert!(loader.path().exists());
    assert_eq!(loader.load().unwrap(), settings);
}
