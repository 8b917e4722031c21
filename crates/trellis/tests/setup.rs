use std::fs;
use tempfile::TempDir;
use trellis::kernel::domain::settings::SettingsInner;
use trellis::{
    AppsError, ModelClass, ModelFilter, ModelOptions, Module, ModuleRegistry, Settings,
    SetupError, bootstrap, contrib, setup,
};

fn settings(installed: &[&str]) -> Settings {
    Settings::new(SettingsInner {
        secret_key: "test".to_owned(),
        installed_apps: installed.iter().map(ToString::to_string).collect(),
        ..SettingsInner::default()
    })
}

fn blog() -> ModuleRegistry {
    ModuleRegistry::new().with(Module::new("blog").path("/srv/blog")).with(
        Module::new("blog.models").body(|apps| {
            let post = std::sync::Arc::new(ModelClass::new(ModelOptions::new(
                "blog",
                "Post",
                "blog.models",
            )));
            post.relate_lazily(apps, "author", ("auth", "User"));
            apps.register_model("blog", post)
        }),
    )
}

#[test]
fn bundled_and_project_apps_populate_together() {
    let settings = settings(&[
        "trellis.contrib.contenttypes",
        "trellis.contrib.auth",
        "trellis.contrib.admin",
        "blog",
    ]);

    let apps = setup(&settings, blog()).unwrap();

    let labels: Vec<String> =
        apps.get_app_configs().unwrap().iter().map(|c| c.label().to_owned()).collect();
    assert_eq!(labels, ["contenttypes", "auth", "admin", "blog"]);
    assert!(apps.get_model("admin.LogEntry", None).is_ok());
    assert!(apps.pending_model_keys().is_empty());
    assert_eq!(apps.get_models(ModelFilter::empty()).unwrap().len(), 6);
}

#[test]
fn project_modules_override_bundled_ones() {
    let modules = ModuleRegistry::new().with(Module::new("trellis.contrib.contenttypes.models"));

    let apps = setup(&settings(&["trellis.contrib.contenttypes"]), modules).unwrap();

    assert!(apps.get_models(ModelFilter::ALL).unwrap().is_empty());
}

#[test]
fn populate_failures_are_wrapped_with_context() {
    let err = setup(&settings(&["blog", "ghost"]), blog()).unwrap_err();

    assert!(matches!(
        &err,
        SetupError::Apps { source: AppsError::Import { .. }, context: Some(_) }
    ));
    assert_eq!(
        err.to_string(),
        "App registry error (Failed to populate the app registry): No module named 'ghost'"
    );
}

#[test]
fn bootstrap_reads_the_settings_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.toml");
    fs::write(
        &path,
        r#"
secret_key = "from-file"
installed_apps = ["trellis.contrib.contenttypes", "blog"]
"#,
    )?;

    let (settings, apps) = bootstrap(Some(path.as_path()), blog())?;

    assert_eq!(settings.secret_key, "from-file");
    assert!(apps.is_installed("blog")?);
    // `auth` isn't installed, the relation stays pending.
    assert_eq!(apps.pending_model_keys().len(), 1);
    Ok(())
}

#[test]
fn bootstrap_reports_settings_errors() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.toml");
    let err = bootstrap(Some(missing.as_path()), ModuleRegistry::new()).unwrap_err();
    assert!(matches!(err, SetupError::Settings { .. }));
}

#[test]
fn default_features_enable_every_bundled_app() {
    assert_eq!(contrib::ENABLED, ["contenttypes", "auth", "admin"]);
    assert!(contrib::is_enabled("admin"));
    assert!(!contrib::is_enabled("sessions"));
}
