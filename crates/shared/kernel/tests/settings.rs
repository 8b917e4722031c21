use std::fs;
use tempfile::TempDir;
use trellis_kernel::config::{SettingsError, load_settings, validate_settings};
use trellis_kernel::domain::settings::SettingsInner;
use trellis_kernel::Settings;

fn write_settings(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("settings.toml");
    fs::write(&path, body).expect("write settings file");
    path
}

#[test]
fn loads_settings_from_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        r#"
secret_key = "not-so-secret"
debug = true
installed_apps = ["trellis.contrib.contenttypes", "trellis.contrib.auth"]

[logging]
level = "debug"
console = false
"#,
    );

    let settings = load_settings(Some(&path)).expect("settings should load");
    assert!(settings.debug);
    assert_eq!(settings.installed_apps, ["trellis.contrib.contenttypes", "trellis.contrib.auth"]);
    assert_eq!(settings.auth_user_model, "auth.User");
    assert_eq!(settings.logging.level, "debug");
    assert!(!settings.logging.console);
}

#[test]
fn empty_secret_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "installed_apps = []\n");

    let err = load_settings(Some(&path)).expect_err("secret key is required");
    assert!(matches!(err, SettingsError::ImproperlyConfigured { .. }));
    assert!(err.to_string().contains("SECRET_KEY"));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_settings(Some(dir.path().join("absent.toml"))).expect_err("file is required");
    assert!(matches!(err, SettingsError::Config { context: Some(_), .. }));
}

#[test]
fn blank_installed_app_is_rejected() {
    let settings = Settings::new(SettingsInner {
        secret_key: "k".to_owned(),
        installed_apps: vec!["blog".to_owned(), "  ".to_owned()],
        ..SettingsInner::default()
    });

    let err = validate_settings(&settings).expect_err("blank entry");
    assert!(err.to_string().contains("position 1"));
}
