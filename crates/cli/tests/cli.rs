use assert_cmd::Command;
use predicates::prelude::*;

fn shelf(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.env("SHELF_CONFIG_DIR", config_dir)
        .env_remove("SHELF_ENV")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    shelf(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn migrate_applies_once() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("catalog.db").display());

    shelf(dir.path())
        .env("SHELF_DATABASE__URL", &url)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("applied 1 migration(s)"));

    shelf(dir.path())
        .env("SHELF_DATABASE__URL", &url)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("applied 0 migration(s)"));
}

#[test]
fn config_prints_layered_settings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("base.toml"), "[server]\nport = 9191\n").unwrap();

    let output = shelf(dir.path()).arg("config").output().unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["server"]["port"], 9191);
    assert_eq!(settings["environment"], "local");
    assert_eq!(settings["database"]["url"], "sqlite://shelf.db");
}

#[test]
fn unknown_environment_fails() {
    let dir = tempfile::tempdir().unwrap();
    shelf(dir.path())
        .env("SHELF_ENV", "moon")
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported environment"));
}
