use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Project {
    _dir: TempDir,
    settings: PathBuf,
}

fn project(installed: &[&str]) -> Project {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.toml");
    let apps = installed.iter().map(|app| format!("\"{app}\"")).collect::<Vec<_>>().join(", ");
    fs::write(
        &settings,
        format!("secret_key = \"cli\"\ninstalled_apps = [{apps}]\n\n[logging]\nlevel = \"warn\"\n"),
    )
    .unwrap();
    Project { _dir: dir, settings }
}

fn manage(project: &Project) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("trellis-manage");
    cmd.env_remove("RUST_LOG").arg("--settings").arg(&project.settings);
    cmd
}

const ALL_BUNDLED: &[&str] =
    &["trellis.contrib.contenttypes", "trellis.contrib.auth", "trellis.contrib.admin"];

#[test]
fn check_passes_for_a_complete_install() {
    let project = project(ALL_BUNDLED);

    manage(&project)
        .arg("check")
        .assert()
        .success()
        .stdout("System check identified no issues (3 apps, 8 models).\n");
}

#[test]
fn check_fails_on_unresolved_references() {
    let project = project(&["trellis.contrib.auth"]);

    manage(&project)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("contenttypes.contenttype"))
        .stderr(predicate::str::contains("unresolved model reference"));
}

#[test]
fn apps_lists_labels_and_verbose_names() {
    let project = project(ALL_BUNDLED);

    manage(&project)
        .arg("apps")
        .assert()
        .success()
        .stdout(predicate::str::contains("contenttypes"))
        .stdout(predicate::str::contains("Authentication and Authorization"))
        .stdout(predicate::str::contains("Administration"));
}

#[test]
fn models_all_includes_through_tables() {
    let project = project(ALL_BUNDLED);

    manage(&project)
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin.LogEntry"))
        .stdout(predicate::str::contains("auth.Group_permissions").not());

    manage(&project)
        .args(["models", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auth.Group_permissions"));
}

#[test]
fn model_reports_unknown_references() {
    let project = project(ALL_BUNDLED);

    manage(&project)
        .args(["model", "auth.Member"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("App 'auth' doesn't have a 'Member' model."));

    manage(&project)
        .args(["model", "auth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be of the form 'app_label.ModelName'"));
}

#[test]
fn unknown_installed_app_fails_startup() {
    let project = project(&["blog"]);

    manage(&project)
        .arg("apps")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No module named 'blog'"));
}

#[test]
fn missing_settings_file_is_reported() {
    let dir = TempDir::new().unwrap();

    assert_cmd::cargo::cargo_bin_cmd!("trellis-manage")
        .arg("--settings")
        .arg(dir.path().join("absent.toml"))
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load settings"));
}
