use parking_lot::Mutex;
use std::sync::Arc;
use trellis_admin::{APP_NAME, install};
use trellis_apps::{Apps, Module, ModuleRegistry};
use trellis_kernel::Settings;
use trellis_kernel::domain::settings::SettingsInner;

type Seen = Arc<Mutex<Vec<&'static str>>>;

fn resolver(settings: &Settings, seen: &Seen) -> ModuleRegistry {
    let mut modules = ModuleRegistry::new();
    trellis_contenttypes::install(&mut modules, settings);
    trellis_auth::install(&mut modules, settings);
    install(&mut modules, settings);

    for app in ["blog", "shop"] {
        modules.register(Module::new(app).path(format!("/srv/{app}")));
    }
    let sink = Arc::clone(seen);
    modules.register(Module::new("blog.admin").body(move |_| {
        sink.lock().push("blog.admin");
        Ok(())
    }));
    modules
}

const CORE: [&str; 3] = [trellis_contenttypes::APP_NAME, trellis_auth::APP_NAME, APP_NAME];

#[test]
fn admin_config_discovers_admin_modules_when_ready() {
    let settings = Settings::default();
    let seen = Seen::default();
    let installed = CORE.iter().copied().chain(["blog", "shop"]);

    let apps = Apps::with_installed(resolver(&settings, &seen), installed).unwrap();

    assert_eq!(*seen.lock(), ["blog.admin"]);
    let admin = apps.get_app_config("admin").unwrap();
    assert_eq!(admin.verbose_name(), "Administration");
    assert!(apps.pending_model_keys().is_empty());
}

#[test]
fn simple_admin_config_skips_discovery() {
    let settings = Settings::default();
    let seen = Seen::default();
    let installed = [
        trellis_contenttypes::APP_NAME,
        trellis_auth::APP_NAME,
        "trellis.contrib.admin.apps.SimpleAdminConfig",
        "blog",
    ];

    let apps = Apps::with_installed(resolver(&settings, &seen), installed).unwrap();

    assert!(seen.lock().is_empty());
    assert!(apps.get_model("admin.LogEntry", None).is_ok());
}

#[test]
fn log_entry_relates_to_user_and_content_type_once_both_exist() {
    let settings = Settings::default();
    let seen = Seen::default();
    let apps = Apps::with_installed(resolver(&settings, &seen), [APP_NAME]).unwrap();

    let mut waiting: Vec<String> =
        apps.pending_model_keys().iter().map(ToString::to_string).collect();
    waiting.sort();
    assert_eq!(waiting, ["auth.user"]);

    // Registering the user model alone isn't enough.
    trellis_auth::register_models(&apps, "auth.User").unwrap();
    let waiting: Vec<String> = apps.pending_model_keys().iter().map(ToString::to_string).collect();
    assert_eq!(waiting, ["contenttypes.contenttype"]);
}

#[test]
fn malformed_user_model_fails_model_import() {
    let settings = Settings::new(SettingsInner {
        auth_user_model: "member".to_owned(),
        ..SettingsInner::default()
    });
    let seen = Seen::default();

    let err = Apps::with_installed(resolver(&settings, &seen), [APP_NAME]).unwrap_err();

    assert!(err.to_string().contains("AUTH_USER_MODEL must be of the form"));
}
