use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn pwdvault(data_dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("pwdvault").unwrap();
    cmd.env("PWDVAULT_DATA_DIR", data_dir)
        .env_remove("VAULT_ADDR")
        .env_remove("PWDVAULT_ROLE_ID")
        .env_remove("PWDVAULT_SECRET_ID")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn generate_prints_strong_password() {
    let dir = tempdir().unwrap();
    let output = pwdvault(dir.path()).arg("generate").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let password = stdout.trim_end();
    assert_eq!(password.chars().count(), 20);
    assert!(password.chars().any(|c| c.is_ascii_uppercase()));
    assert!(password.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn init_writes_settings() {
    let dir = tempdir().unwrap();
    pwdvault(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));

    assert!(dir.path().join("config.json").exists());
    assert!(dir.path().join("data").join("credentials.json").exists());
}

#[test]
fn list_empty_vault() {
    let dir = tempdir().unwrap();
    pwdvault(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No credentials stored."));
}

#[test]
fn audit_empty_log() {
    let dir = tempdir().unwrap();
    pwdvault(dir.path())
        .args(["audit", "--limit", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit entries."));
}

#[test]
fn set_vault_then_show() {
    let dir = tempdir().unwrap();
    pwdvault(dir.path())
        .args([
            "config",
            "set-vault",
            "--address",
            "https://vault.internal:8200",
            "--role-id",
            "ops-role",
        ])
        .assert()
        .success();

    pwdvault(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://vault.internal:8200"))
        .stdout(predicate::str::contains("ops-role"));
}

#[test]
fn show_reflects_environment_overrides() {
    let dir = tempdir().unwrap();
    pwdvault(dir.path())
        .env("VAULT_ADDR", "http://10.0.0.5:8200")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://10.0.0.5:8200"))
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn add_without_role_id_fails_with_config_hint() {
    let dir = tempdir().unwrap();
    pwdvault(dir.path())
        .args(["add", "github", "alice", "--generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config set-vault --role-id"));
}

#[test]
fn unreachable_vault_shows_generic_message() {
    let dir = tempdir().unwrap();
    pwdvault(dir.path())
        .env("VAULT_ADDR", "http://127.0.0.1:1")
        .env("PWDVAULT_ROLE_ID", "role")
        .env("PWDVAULT_SECRET_ID", "s3cr3t-id-value")
        .args(["add", "github", "alice", "--generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please try again later"))
        .stderr(predicate::str::contains("s3cr3t-id-value").not());

    pwdvault(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No credentials stored."));
}

#[test]
fn export_empty_vault_writes_header_only() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("export.csv");
    pwdvault(dir.path())
        .arg("export")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 0 credentials"));

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "Id,AppCategory,AppName,UserName,IconName,CreationTime,UpdateTime\n"
    );
}

#[test]
fn export_with_passwords_needs_vault_login() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("export.csv");
    pwdvault(dir.path())
        .args(["export", "--include-passwords"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config set-vault --role-id"));

    assert!(!output.exists());
}

#[test]
fn show_does_not_persist_environment_overrides() {
    let dir = tempdir().unwrap();
    pwdvault(dir.path()).arg("init").assert().success();
    pwdvault(dir.path())
        .env("VAULT_ADDR", "http://10.0.0.5:8200")
        .args(["config", "show"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert!(!saved.contains("10.0.0.5"));
}
